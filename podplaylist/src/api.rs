//! API REST du lecteur distant.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use utoipa::ToSchema;

use podcontrol::PlayStatus;

use crate::browse::{BrowseEntry, MusicLibrary};
use crate::error::Error;
use crate::queue::PlayQueue;

/// État partagé des handlers : la file unique et la bibliothèque.
///
/// Construit par le binaire et injecté via `with_state` (pas d'état global).
#[derive(Clone)]
pub struct PlayerApiState {
    pub queue: PlayQueue,
    pub library: Arc<MusicLibrary>,
}

/// Router `/playlist` + `/browse` de l'API du lecteur.
pub fn player_api_router(state: PlayerApiState) -> Router {
    Router::new()
        .route("/playlist/{action}", post(playlist_action))
        .route("/browse", get(browse))
        .with_state(state)
}

/// Ensemble fermé des actions de la file de lecture.
///
/// Tout nom hors de cette liste est rejeté explicitement
/// (`UNKNOWN_OPERATION`), il n'y a pas de dispatch par réflexion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaylistAction {
    SetSongs,
    AppendSongs,
    NextSong,
    PrevSong,
    SetStatus,
    SetCurrentSong,
    SetVolume,
    GetPlaylist,
    GetPlayerInfo,
    WasUpdated,
}

impl FromStr for PlaylistAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "set_songs" => Ok(PlaylistAction::SetSongs),
            "append_songs" => Ok(PlaylistAction::AppendSongs),
            "next_song" => Ok(PlaylistAction::NextSong),
            "prev_song" => Ok(PlaylistAction::PrevSong),
            "set_status" => Ok(PlaylistAction::SetStatus),
            "set_current_song" => Ok(PlaylistAction::SetCurrentSong),
            "set_volume" => Ok(PlaylistAction::SetVolume),
            "get_playlist" => Ok(PlaylistAction::GetPlaylist),
            "get_player_info" => Ok(PlaylistAction::GetPlayerInfo),
            "was_updated" => Ok(PlaylistAction::WasUpdated),
            other => Err(Error::UnknownOperation(other.to_string())),
        }
    }
}

/// Requête `set_songs`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetSongsRequest {
    pub songs: Vec<String>,
    #[serde(default)]
    #[schema(example = 0)]
    pub start_index: usize,
}

/// Requête `append_songs`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AppendSongsRequest {
    pub songs: Vec<String>,
}

/// Requête `set_status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    #[schema(value_type = String, example = "playing")]
    pub status: PlayStatus,
}

/// Requête `set_current_song`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetCurrentSongRequest {
    pub current_song: usize,
    #[serde(default)]
    pub play: bool,
}

/// Requête `set_volume`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetVolumeRequest {
    pub volume: u16,
}

/// Paramètres de `GET /browse`.
#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    /// Chemin relatif à la racine musicale ("" = racine).
    #[serde(default)]
    pub path: String,
}

/// Réponse d'erreur REST générique.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/playlist/{action}",
    tag = "player",
    params(
        ("action" = String, Path,
         description = "set_songs | append_songs | next_song | prev_song | \
                        set_status | set_current_song | set_volume | \
                        get_playlist | get_player_info | was_updated")
    ),
    request_body = String,
    responses(
        (status = 200, description = "Snapshot de la file après l'opération", body = crate::queue::QueueSnapshot),
        (status = 400, description = "Action inconnue ou paramètres invalides", body = ErrorResponse),
        (status = 502, description = "Le device n'a pas répondu", body = ErrorResponse)
    )
)]
pub async fn playlist_action(
    State(state): State<PlayerApiState>,
    Path(action): Path<String>,
    body: Bytes,
) -> Response {
    // Corps vide accepté pour les actions sans paramètres
    let params = if body.is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_slice(&body).map_err(|err| Error::InvalidParams(action.clone(), err))
    };

    let result = match params {
        Ok(params) => match action.parse::<PlaylistAction>() {
            Ok(action) => run_action(&state, action, params).await,
            Err(err) => Err(err),
        },
        Err(err) => Err(err),
    };

    match result {
        Ok(response) => response,
        Err(err) => map_error(err),
    }
}

async fn run_action(
    state: &PlayerApiState,
    action: PlaylistAction,
    params: Value,
) -> Result<Response, Error> {
    let queue = &state.queue;

    let response = match action {
        PlaylistAction::SetSongs => {
            let req: SetSongsRequest = decode("set_songs", params)?;
            Json(queue.set_songs(req.songs, req.start_index).await?).into_response()
        }
        PlaylistAction::AppendSongs => {
            let req: AppendSongsRequest = decode("append_songs", params)?;
            Json(queue.append_songs(req.songs).await?).into_response()
        }
        PlaylistAction::NextSong => Json(queue.next_song().await?).into_response(),
        PlaylistAction::PrevSong => Json(queue.prev_song().await?).into_response(),
        PlaylistAction::SetStatus => {
            let req: SetStatusRequest = decode("set_status", params)?;
            Json(queue.set_status(req.status).await?).into_response()
        }
        PlaylistAction::SetCurrentSong => {
            let req: SetCurrentSongRequest = decode("set_current_song", params)?;
            Json(queue.set_current_song(req.current_song, req.play).await?).into_response()
        }
        PlaylistAction::SetVolume => {
            let req: SetVolumeRequest = decode("set_volume", params)?;
            let volume = queue.set_volume(req.volume).await?;
            Json(json!({ "volume": volume })).into_response()
        }
        PlaylistAction::GetPlaylist => Json(queue.snapshot().await?).into_response(),
        PlaylistAction::GetPlayerInfo => Json(queue.player_info().await?).into_response(),
        PlaylistAction::WasUpdated => {
            let counter = queue.refresh().await?;
            Json(json!({ "update_counter": counter })).into_response()
        }
    };

    Ok(response)
}

fn decode<T: serde::de::DeserializeOwned>(action: &str, params: Value) -> Result<T, Error> {
    serde_json::from_value(params).map_err(|err| Error::InvalidParams(action.to_string(), err))
}

#[utoipa::path(
    get,
    path = "/browse",
    tag = "player",
    params(
        ("path" = Option<String>, Query, description = "Chemin relatif à la racine musicale")
    ),
    responses(
        (status = 200, description = "Enfants immédiats du répertoire", body = [BrowseEntry])
    )
)]
pub async fn browse(
    State(state): State<PlayerApiState>,
    Query(query): Query<BrowseQuery>,
) -> Response {
    match state.library.browse(&query.path) {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => map_error(err),
    }
}

fn map_error(err: Error) -> Response {
    let (status, code) = match &err {
        Error::UnknownOperation(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_OPERATION"),
        Error::InvalidParams(..) => (StatusCode::BAD_REQUEST, "INVALID_PARAMS"),
        Error::Device(_) => (StatusCode::BAD_GATEWAY, "DEVICE_ERROR"),
        Error::Library(_) => (StatusCode::INTERNAL_SERVER_ERROR, "LIBRARY_ERROR"),
    };

    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: err.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_actions_parse() {
        assert_eq!(
            "set_songs".parse::<PlaylistAction>().unwrap(),
            PlaylistAction::SetSongs
        );
        assert_eq!(
            "was_updated".parse::<PlaylistAction>().unwrap(),
            PlaylistAction::WasUpdated
        );
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = "delete_everything".parse::<PlaylistAction>().unwrap_err();
        assert!(matches!(err, Error::UnknownOperation(name) if name == "delete_everything"));
    }
}
