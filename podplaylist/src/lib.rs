//! # podplaylist - File de lecture et API du lecteur distant
//!
//! Cette crate porte l'état central de PodRemote :
//!
//! - **PlayQueue** : l'unique file de lecture du processus. Elle détient la
//!   liste des morceaux, l'index courant, le statut souhaité et un compteur
//!   de mises à jour, et réconcilie cet état souhaité avec l'état réel du
//!   lecteur via podcontrol. Toutes les mutations sont sérialisées par un
//!   mutex unique : les handlers HTTP et le callback d'avance automatique
//!   ne peuvent pas s'entrelacer.
//! - **Avance automatique** : à chaque réconciliation qui laisse le lecteur
//!   en lecture, une tâche one-shot est armée pour la durée restante du
//!   morceau; à l'échéance elle enchaîne sur le morceau suivant. Au plus
//!   une tâche est en vol, la précédente étant annulée à chaque nouvelle
//!   réconciliation.
//! - **MusicLibrary** : listing du répertoire musical configuré (enfants
//!   immédiats uniquement), avec marquage des fichiers audio et contrôle de
//!   confinement sous la racine.
//! - **API REST** : `POST /playlist/{action}` (ensemble fermé d'actions) et
//!   `GET /browse`, documentés OpenAPI.
//!
//! # Exemple
//!
//! ```no_run
//! use podcontrol::Sl4aPlayer;
//! use podplaylist::PlayQueue;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> podplaylist::Result<()> {
//! let device = Arc::new(Sl4aPlayer::new("127.0.0.1", 45001, None));
//! let queue = PlayQueue::new(device, "/sdcard/Music", vec!["mp3".into()])?;
//!
//! queue.set_songs(vec!["a.mp3".into(), "b.mp3".into()], 0).await?;
//! let snapshot = queue.set_status(podcontrol::PlayStatus::Playing).await?;
//! println!("now: {:?}", snapshot.status);
//! # Ok(())
//! # }
//! ```

pub mod api;
mod browse;
mod error;
pub mod openapi;
mod queue;

// Réexports publics
pub use browse::{BrowseEntry, MusicLibrary};
pub use error::{Error, Result};
pub use queue::{PlayQueue, PlayerInfo, PlayerInfoResponse, QueueSnapshot, TrackEntry};
