//! # podcontrol - Contrôle du lecteur média du téléphone
//!
//! Cette crate fournit la façade de contrôle du lecteur média embarqué :
//!
//! - [`MediaDevice`] : le contrat du lecteur (play/resume/pause/stop,
//!   snapshot d'état, volume), derrière lequel les couches hautes restent
//!   indépendantes du transport.
//! - [`Sl4aPlayer`] : l'implémentation concrète parlant au facade SL4A du
//!   téléphone (JSON-RPC ligne par ligne sur TCP).
//! - [`reconcile`] : la logique pure qui traduit un état souhaité
//!   `(statut, morceau)` en l'unique commande device nécessaire.
//!
//! Les couches hautes (podplaylist) ne manipulent jamais le client RPC
//! directement : tout passe par le trait [`MediaDevice`].

mod device;
mod errors;
pub mod reconcile;
mod sl4a;

pub use device::{DeviceInfo, MediaDevice, PlayStatus};
pub use errors::{ControlError, Result};
pub use sl4a::{Sl4aClient, Sl4aPlayer};
