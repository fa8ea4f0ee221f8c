use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ControlError, Result};

/// Snapshot de l'état du lecteur média, tel que rapporté par le device.
///
/// `position` et `duration` sont en millisecondes. `url` est la ressource
/// actuellement chargée, absente quand rien n'est chargé.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub loaded: bool,
    pub isplaying: bool,
    pub url: Option<String>,
    #[serde(default)]
    pub position: u64,
    #[serde(default)]
    pub duration: u64,
}

impl DeviceInfo {
    /// Décode le résultat brut de `mediaPlayInfo`.
    ///
    /// `loaded` est obligatoire; `position` et `duration` le deviennent dès
    /// qu'un média est chargé. Les champs manquants remontent en
    /// [`ControlError::MissingField`] plutôt que d'être devinés.
    pub fn from_value(value: &Value) -> Result<Self> {
        let loaded = value
            .get("loaded")
            .and_then(Value::as_bool)
            .ok_or(ControlError::MissingField("loaded"))?;

        if !loaded {
            return Ok(DeviceInfo::default());
        }

        let position = value
            .get("position")
            .and_then(Value::as_u64)
            .ok_or(ControlError::MissingField("position"))?;
        let duration = value
            .get("duration")
            .and_then(Value::as_u64)
            .ok_or(ControlError::MissingField("duration"))?;

        Ok(DeviceInfo {
            loaded,
            isplaying: value
                .get("isplaying")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            url: value
                .get("url")
                .and_then(Value::as_str)
                .map(str::to_string),
            position,
            duration,
        })
    }

    /// Temps de lecture restant en millisecondes.
    pub fn remaining_ms(&self) -> u64 {
        self.duration.saturating_sub(self.position)
    }

    /// Vrai quand le morceau chargé est arrivé en fin de piste.
    pub fn is_finished(&self) -> bool {
        self.loaded && self.position == self.duration
    }
}

/// Statut logique de lecture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayStatus {
    Playing,
    Paused,
    Stopped,
}

impl PlayStatus {
    /// Classe un snapshot device en statut logique : Playing si le device
    /// joue, Paused si un média est chargé sans jouer, Stopped sinon.
    pub fn from_info(info: &DeviceInfo) -> Self {
        if info.isplaying {
            PlayStatus::Playing
        } else if info.loaded {
            PlayStatus::Paused
        } else {
            PlayStatus::Stopped
        }
    }

    /// Libellé bas de casse, identique à la forme sérialisée.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayStatus::Playing => "playing",
            PlayStatus::Paused => "paused",
            PlayStatus::Stopped => "stopped",
        }
    }
}

/// Contrat du lecteur média embarqué.
///
/// Les appels sont synchrones et supposés rapides (le lecteur est local au
/// device). Aucune méthode ne bloque indéfiniment; les fautes de transport
/// remontent en [`ControlError`].
pub trait MediaDevice: Send + Sync {
    /// Charge l'URL donnée et démarre la lecture.
    fn play(&self, url: &str) -> Result<()>;

    /// Reprend la lecture du média déjà chargé.
    fn resume(&self) -> Result<()>;

    /// Met la lecture en pause.
    fn pause(&self) -> Result<()>;

    /// Arrête la lecture et décharge le média.
    fn stop(&self) -> Result<()>;

    /// Snapshot de l'état courant du lecteur.
    fn info(&self) -> Result<DeviceInfo>;

    /// Volume média courant.
    fn volume(&self) -> Result<u16>;

    /// Définit le volume média.
    fn set_volume(&self, volume: u16) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_playing() {
        let info = DeviceInfo {
            loaded: true,
            isplaying: true,
            url: Some("file:///a.mp3".into()),
            position: 10,
            duration: 1000,
        };
        assert_eq!(PlayStatus::from_info(&info), PlayStatus::Playing);
    }

    #[test]
    fn classify_paused() {
        let info = DeviceInfo {
            loaded: true,
            isplaying: false,
            url: Some("file:///a.mp3".into()),
            position: 10,
            duration: 1000,
        };
        assert_eq!(PlayStatus::from_info(&info), PlayStatus::Paused);
    }

    #[test]
    fn classify_stopped() {
        assert_eq!(
            PlayStatus::from_info(&DeviceInfo::default()),
            PlayStatus::Stopped
        );
    }

    #[test]
    fn from_value_unloaded() {
        let info = DeviceInfo::from_value(&json!({"loaded": false})).unwrap();
        assert_eq!(info, DeviceInfo::default());
    }

    #[test]
    fn from_value_loaded_requires_times() {
        let err = DeviceInfo::from_value(&json!({"loaded": true, "duration": 1000})).unwrap_err();
        assert!(matches!(err, ControlError::MissingField("position")));
    }

    #[test]
    fn from_value_full() {
        let info = DeviceInfo::from_value(&json!({
            "loaded": true,
            "isplaying": true,
            "url": "file:///sdcard/Music/a.mp3",
            "position": 1234,
            "duration": 180000,
        }))
        .unwrap();
        assert!(info.isplaying);
        assert_eq!(info.remaining_ms(), 178766);
        assert!(!info.is_finished());
    }

    #[test]
    fn missing_loaded_is_a_fault() {
        let err = DeviceInfo::from_value(&json!({"isplaying": true})).unwrap_err();
        assert!(matches!(err, ControlError::MissingField("loaded")));
    }
}
