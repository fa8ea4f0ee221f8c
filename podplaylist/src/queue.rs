//! PlayQueue : l'unique file de lecture du processus.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use utoipa::ToSchema;

use podcontrol::reconcile::{reconcile, settle_info};
use podcontrol::{DeviceInfo, MediaDevice, PlayStatus};

use crate::Result;

/// Entrée de la file, avec les métadonnées d'affichage.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct TrackEntry {
    /// Chemin relatif à la racine musicale, tel que passé à `set_songs`.
    pub id: String,
    /// Nom de fichier, pour l'affichage.
    pub name: String,
}

impl TrackEntry {
    fn from_path(id: &str) -> Self {
        let name = Path::new(id)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| id.to_string());
        Self {
            id: id.to_string(),
            name,
        }
    }
}

/// Snapshot du lecteur retourné dans chaque réponse.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PlayerInfo {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub info: DeviceInfo,
    /// Vrai si cette réponse a déclenché une commande device.
    pub changed: bool,
}

/// Réponse de l'action `get_player_info`.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PlayerInfoResponse {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub info: DeviceInfo,
    pub update_counter: u64,
}

/// Snapshot complet de la file, retourné par chaque opération.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct QueueSnapshot {
    #[schema(value_type = String)]
    pub status: PlayStatus,
    pub volume: u16,
    /// Index du morceau courant (0 quand la liste est vide).
    pub current_song: usize,
    pub songs: Vec<TrackEntry>,
    pub player_info: PlayerInfo,
    pub update_counter: u64,
    pub err: String,
}

/// État interne, protégé par le mutex de la file.
struct QueueState {
    songs: Vec<String>,
    current_idx: usize,
    status: PlayStatus,
    last_song: Option<String>,
    last_status: Option<PlayStatus>,
    last_info: DeviceInfo,
    update_counter: u64,
    timer: Option<JoinHandle<()>>,
}

impl QueueState {
    fn current_song(&self) -> Option<String> {
        self.songs.get(self.current_idx).cloned()
    }

    /// Statut effectif : une liste vide force l'arrêt.
    fn effective_status(&self) -> PlayStatus {
        if self.songs.is_empty() {
            PlayStatus::Stopped
        } else {
            self.status
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    fn advance(&mut self) {
        if !self.songs.is_empty() {
            self.current_idx = (self.current_idx + 1) % self.songs.len();
        }
    }
}

struct QueueInner {
    device: Arc<dyn MediaDevice>,
    music_root: PathBuf,
    extensions: Vec<String>,
    state: Mutex<QueueState>,
}

/// File de lecture unique du processus.
///
/// Toutes les opérations passent par le mutex interne : la séquence
/// lecture-décision-commande contre le device est atomique par appel, y
/// compris face au callback d'avance automatique.
#[derive(Clone)]
pub struct PlayQueue {
    inner: Arc<QueueInner>,
}

impl PlayQueue {
    /// Construit la file et arrête le lecteur.
    ///
    /// Le statut initial est celui classé depuis le device après arrêt
    /// (en pratique `Stopped`).
    pub fn new(
        device: Arc<dyn MediaDevice>,
        music_root: impl Into<PathBuf>,
        extensions: Vec<String>,
    ) -> Result<Self> {
        device.stop()?;
        let status = PlayStatus::from_info(&settle_info(device.as_ref())?);

        Ok(Self {
            inner: Arc::new(QueueInner {
                device,
                music_root: music_root.into(),
                extensions,
                state: Mutex::new(QueueState {
                    songs: Vec::new(),
                    current_idx: 0,
                    status,
                    last_song: None,
                    last_status: None,
                    last_info: DeviceInfo::default(),
                    update_counter: 0,
                    timer: None,
                }),
            }),
        })
    }

    /// Remplace la liste des morceaux.
    ///
    /// Les entrées sans extension audio reconnue sont écartées. L'index
    /// courant devient `start_index` modulo la taille de la liste; une liste
    /// résultante vide force l'arrêt.
    pub async fn set_songs(&self, songs: Vec<String>, start_index: usize) -> Result<QueueSnapshot> {
        let songs = self.filter_songs(songs);
        self.mutate(move |st| {
            st.songs = songs;
            if st.songs.is_empty() {
                st.current_idx = 0;
                st.status = PlayStatus::Stopped;
            } else {
                st.current_idx = start_index % st.songs.len();
            }
        })
        .await
    }

    /// Ajoute des morceaux en fin de liste (même filtre que `set_songs`),
    /// sans toucher à l'index courant.
    pub async fn append_songs(&self, songs: Vec<String>) -> Result<QueueSnapshot> {
        let songs = self.filter_songs(songs);
        self.mutate(move |st| {
            st.songs.extend(songs);
            if st.songs.is_empty() {
                st.current_idx = 0;
                st.status = PlayStatus::Stopped;
            }
        })
        .await
    }

    /// Passe au morceau suivant (boucle en fin de liste).
    ///
    /// Naviguer depuis une pause abandonne le contexte de lecture : le
    /// statut repasse à l'arrêt.
    pub async fn next_song(&self) -> Result<QueueSnapshot> {
        self.mutate(|st| {
            debug!("Next song");
            if st.status == PlayStatus::Paused {
                st.status = PlayStatus::Stopped;
            }
            st.advance();
        })
        .await
    }

    /// Revient au morceau précédent (butée à 0, pas de boucle).
    pub async fn prev_song(&self) -> Result<QueueSnapshot> {
        self.mutate(|st| {
            debug!("Previous song");
            if st.status == PlayStatus::Paused {
                st.status = PlayStatus::Stopped;
            }
            st.current_idx = st.current_idx.saturating_sub(1);
        })
        .await
    }

    /// Change le statut souhaité. Sans morceaux, toute demande retombe sur
    /// l'arrêt.
    pub async fn set_status(&self, status: PlayStatus) -> Result<QueueSnapshot> {
        self.mutate(move |st| {
            st.status = if st.songs.is_empty() {
                PlayStatus::Stopped
            } else {
                status
            };
        })
        .await
    }

    /// Sélectionne un morceau par index (modulo la taille de la liste).
    pub async fn set_current_song(&self, index: usize, play: bool) -> Result<QueueSnapshot> {
        self.mutate(move |st| {
            if !st.songs.is_empty() {
                st.current_idx = index % st.songs.len();
                if play {
                    st.status = PlayStatus::Playing;
                }
            }
        })
        .await
    }

    /// Pousse le volume au device et retourne la valeur relue.
    ///
    /// Ne déclenche pas de réconciliation.
    pub async fn set_volume(&self, volume: u16) -> Result<u16> {
        let mut st = self.inner.state.lock().await;
        st.update_counter += 1;
        self.inner.device.set_volume(volume)?;
        Ok(self.inner.device.volume()?)
    }

    /// Snapshot courant, en passant par la porte de réconciliation.
    ///
    /// N'incrémente pas le compteur de mises à jour : c'est le chemin de
    /// polling des clients.
    pub async fn snapshot(&self) -> Result<QueueSnapshot> {
        let mut st = self.inner.state.lock().await;
        self.produce(&mut st)
    }

    /// Snapshot brut du device, avec le compteur de mises à jour.
    pub async fn player_info(&self) -> Result<PlayerInfoResponse> {
        let st = self.inner.state.lock().await;
        let info = settle_info(self.inner.device.as_ref())?;
        Ok(PlayerInfoResponse {
            info,
            update_counter: st.update_counter,
        })
    }

    /// Détection de changement bon marché.
    ///
    /// Adopte un changement de statut déclenché hors de l'API (bouton
    /// physique, autre application) et retourne le compteur de mises à
    /// jour. Aucune commande de lecture n'est émise.
    pub async fn refresh(&self) -> Result<u64> {
        let mut st = self.inner.state.lock().await;
        let info = settle_info(self.inner.device.as_ref())?;
        let actual = PlayStatus::from_info(&info);

        if actual != st.status {
            debug!(
                desired = st.status.as_str(),
                actual = actual.as_str(),
                "Adopting externally changed status"
            );
            st.status = actual;
            st.last_status = Some(actual);
            st.update_counter += 1;
            if actual != PlayStatus::Playing {
                st.cancel_timer();
            }
        }
        st.last_info = info;
        Ok(st.update_counter)
    }

    /// Annule la tâche d'avance automatique en attente.
    pub async fn shutdown(&self) {
        let mut st = self.inner.state.lock().await;
        st.cancel_timer();
    }

    /// Mutation générique : incrémente le compteur, applique `f`, puis
    /// produit le snapshot via la porte de réconciliation.
    async fn mutate<F>(&self, f: F) -> Result<QueueSnapshot>
    where
        F: FnOnce(&mut QueueState),
    {
        let mut st = self.inner.state.lock().await;
        st.update_counter += 1;
        f(&mut st);
        self.produce(&mut st)
    }

    /// Porte de réconciliation.
    ///
    /// Compare `(morceau courant, statut souhaité)` à la dernière paire
    /// poussée au device. En cas d'écart : annule le timer, réconcilie,
    /// réarme le timer si la lecture continue, et marque `changed`. Sinon
    /// le dernier snapshot connu est retourné sans commande device.
    fn produce(&self, st: &mut QueueState) -> Result<QueueSnapshot> {
        let device = self.inner.device.as_ref();

        let pending = st.last_song != st.current_song() || st.last_status != Some(st.status);

        // Purge d'un état "fin de piste". Sur le chemin de poll pur (rien à
        // réconcilier), la file avance aussi d'un cran : le timer aurait
        // fait la même chose, ce chemin couvre le poll qui arrive avant
        // lui. Quand une mutation attend déjà (le timer vient d'appeler
        // next_song), l'avance a déjà eu lieu.
        let raw = device.info()?;
        let info = if raw.is_finished() {
            device.stop()?;
            if !pending && st.status == PlayStatus::Playing && !st.songs.is_empty() {
                debug!("Track ran out, advancing before reconciling");
                st.advance();
                st.update_counter += 1;
            }
            device.info()?
        } else {
            raw
        };

        let current = st.current_song();

        // Adoption d'un statut changé hors de l'API, uniquement quand rien
        // n'attend d'être réconcilié (sinon on écraserait la mutation).
        if st.last_song == current && st.last_status == Some(st.status) {
            let actual = PlayStatus::from_info(&info);
            if actual != st.status {
                debug!(
                    desired = st.status.as_str(),
                    actual = actual.as_str(),
                    "Adopting externally changed status"
                );
                st.status = actual;
                st.update_counter += 1;
            }
        }

        let changed = st.last_song != current || st.last_status != Some(st.status);
        if changed {
            st.cancel_timer();

            let status = st.effective_status();
            let url = match (&current, status) {
                (Some(song), PlayStatus::Playing) | (Some(song), PlayStatus::Paused) => {
                    Some(self.song_url(song))
                }
                _ => None,
            };
            let final_info = reconcile(device, status, url.as_deref())?;

            st.last_song = current;
            st.last_status = Some(st.status);
            if status == PlayStatus::Playing {
                self.arm_timer(st, &final_info);
            }
            st.last_info = final_info;
        } else {
            st.last_info = info;
        }

        Ok(QueueSnapshot {
            status: st.status,
            volume: device.volume()?,
            current_song: st.current_idx,
            songs: st.songs.iter().map(|s| TrackEntry::from_path(s)).collect(),
            player_info: PlayerInfo {
                info: st.last_info.clone(),
                changed,
            },
            update_counter: st.update_counter,
            err: String::new(),
        })
    }

    /// Arme la tâche d'avance automatique pour la durée restante.
    fn arm_timer(&self, st: &mut QueueState, info: &DeviceInfo) {
        let remaining = info.remaining_ms();
        if remaining == 0 {
            return;
        }

        debug!(remaining_ms = remaining, "Arming auto-advance");
        let queue = self.clone();
        st.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(remaining)).await;
            if let Err(err) = queue.next_song().await {
                warn!("Auto-advance failed: {}", err);
            }
        }));
    }

    fn song_url(&self, song: &str) -> String {
        format!("file://{}", self.inner.music_root.join(song).display())
    }

    fn filter_songs(&self, songs: Vec<String>) -> Vec<String> {
        songs.into_iter().filter(|s| self.is_audio(s)).collect()
    }

    fn is_audio(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(OsStr::to_str)
            .map(|ext| {
                self.inner
                    .extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}
