//! Documentation OpenAPI de l'API du lecteur.

use utoipa::OpenApi;

/// Documentation OpenAPI pour l'API du lecteur distant.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::playlist_action,
        crate::api::browse,
    ),
    components(
        schemas(
            crate::queue::QueueSnapshot,
            crate::queue::TrackEntry,
            crate::queue::PlayerInfo,
            crate::queue::PlayerInfoResponse,
            crate::browse::BrowseEntry,
            crate::api::SetSongsRequest,
            crate::api::AppendSongsRequest,
            crate::api::SetStatusRequest,
            crate::api::SetCurrentSongRequest,
            crate::api::SetVolumeRequest,
            crate::api::ErrorResponse,
        )
    ),
    tags(
        (name = "player", description = "File de lecture et bibliothèque du lecteur distant")
    ),
    info(
        title = "PodRemote Player API",
        version = "0.2.0",
        description = r#"
# Contrôle du lecteur distant

- `POST /playlist/{action}` : opérations de la file de lecture. Chaque
  opération retourne un snapshot complet (statut, volume, morceaux, état
  device, compteur de mises à jour). Les noms d'action inconnus sont
  rejetés avec `UNKNOWN_OPERATION`.
- `GET /browse?path=` : enfants immédiats d'un répertoire de la
  bibliothèque, confinés sous la racine configurée.

Le compteur `update_counter` croît à chaque mutation et à chaque changement
de statut détecté côté device : un client peut poller `was_updated` à bas
coût et ne recharger le snapshot que sur changement.
        "#,
    )
)]
pub struct ApiDoc;
