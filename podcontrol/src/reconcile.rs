//! Réconciliation entre l'état souhaité et l'état réel du lecteur.
//!
//! La logique est volontairement pure : à partir d'un statut souhaité et de
//! l'URL du morceau courant, on lit le snapshot du device, on émet l'unique
//! commande nécessaire, puis on relit le snapshot final. Aucun état n'est
//! conservé ici; c'est la file de lecture (podplaylist) qui décide *quand*
//! réconcilier.

use tracing::debug;

use crate::device::{DeviceInfo, MediaDevice, PlayStatus};
use crate::errors::Result;

/// Lit le snapshot du device en purgeant un éventuel état "fin de piste".
///
/// Un morceau arrivé en bout de piste reste chargé avec
/// `position == duration`; le device est alors arrêté et relu pour ne pas
/// laisser ce snapshot périmé polluer les décisions suivantes.
pub fn settle_info(device: &dyn MediaDevice) -> Result<DeviceInfo> {
    let info = device.info()?;
    if info.is_finished() {
        debug!(url = info.url.as_deref(), "Track finished, clearing device");
        device.stop()?;
        return device.info();
    }
    Ok(info)
}

/// Amène le device dans l'état souhaité et retourne le snapshot final.
///
/// `url` est le morceau courant souhaité, ou `None` quand la liste est vide
/// (auquel cas tout statut se traite comme un arrêt).
pub fn reconcile(
    device: &dyn MediaDevice,
    desired: PlayStatus,
    url: Option<&str>,
) -> Result<DeviceInfo> {
    let info = settle_info(device)?;

    match (desired, url) {
        (PlayStatus::Playing, Some(url)) => {
            if !info.isplaying || info.url.as_deref() != Some(url) {
                if info.loaded && info.url.as_deref() == Some(url) {
                    debug!(url, "Resuming paused track");
                    device.resume()?;
                } else {
                    debug!(url, "Loading and playing track");
                    device.play(url)?;
                }
            }
        }
        (PlayStatus::Paused, _) => {
            if info.isplaying {
                debug!("Pausing playback");
                device.pause()?;
            }
        }
        (PlayStatus::Stopped, _) | (PlayStatus::Playing, None) => {
            if info.loaded {
                debug!("Stopping playback");
                device.stop()?;
            }
        }
    }

    device.info()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use std::sync::Mutex;

    /// Device simulé : applique les commandes sur un état en mémoire et
    /// journalise chaque appel.
    struct FakeDevice {
        state: Mutex<DeviceInfo>,
        calls: Mutex<Vec<String>>,
        track_duration: u64,
    }

    impl FakeDevice {
        fn new() -> Self {
            Self {
                state: Mutex::new(DeviceInfo::default()),
                calls: Mutex::new(Vec::new()),
                track_duration: 180_000,
            }
        }

        fn with_state(info: DeviceInfo) -> Self {
            let device = Self::new();
            *device.state.lock().unwrap() = info;
            device
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn log(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    impl MediaDevice for FakeDevice {
        fn play(&self, url: &str) -> Result<()> {
            self.log(format!("play {url}"));
            *self.state.lock().unwrap() = DeviceInfo {
                loaded: true,
                isplaying: true,
                url: Some(url.to_string()),
                position: 0,
                duration: self.track_duration,
            };
            Ok(())
        }

        fn resume(&self) -> Result<()> {
            self.log("resume");
            self.state.lock().unwrap().isplaying = true;
            Ok(())
        }

        fn pause(&self) -> Result<()> {
            self.log("pause");
            self.state.lock().unwrap().isplaying = false;
            Ok(())
        }

        fn stop(&self) -> Result<()> {
            self.log("stop");
            *self.state.lock().unwrap() = DeviceInfo::default();
            Ok(())
        }

        fn info(&self) -> Result<DeviceInfo> {
            Ok(self.state.lock().unwrap().clone())
        }

        fn volume(&self) -> Result<u16> {
            Ok(7)
        }

        fn set_volume(&self, _volume: u16) -> Result<()> {
            Ok(())
        }
    }

    fn playing(url: &str) -> DeviceInfo {
        DeviceInfo {
            loaded: true,
            isplaying: true,
            url: Some(url.to_string()),
            position: 5_000,
            duration: 180_000,
        }
    }

    fn paused(url: &str) -> DeviceInfo {
        DeviceInfo {
            isplaying: false,
            ..playing(url)
        }
    }

    #[test]
    fn play_from_stopped_loads_track() {
        let device = FakeDevice::new();
        let info = reconcile(&device, PlayStatus::Playing, Some("file:///a.mp3")).unwrap();

        assert_eq!(device.calls(), vec!["play file:///a.mp3"]);
        assert!(info.isplaying);
        assert_eq!(info.url.as_deref(), Some("file:///a.mp3"));
    }

    #[test]
    fn play_resumes_same_paused_track() {
        let device = FakeDevice::with_state(paused("file:///a.mp3"));
        reconcile(&device, PlayStatus::Playing, Some("file:///a.mp3")).unwrap();

        assert_eq!(device.calls(), vec!["resume"]);
    }

    #[test]
    fn play_different_track_reloads() {
        let device = FakeDevice::with_state(playing("file:///a.mp3"));
        reconcile(&device, PlayStatus::Playing, Some("file:///b.mp3")).unwrap();

        assert_eq!(device.calls(), vec!["play file:///b.mp3"]);
    }

    #[test]
    fn play_same_playing_track_is_noop() {
        let device = FakeDevice::with_state(playing("file:///a.mp3"));
        reconcile(&device, PlayStatus::Playing, Some("file:///a.mp3")).unwrap();

        assert!(device.calls().is_empty());
    }

    #[test]
    fn pause_only_when_playing() {
        let device = FakeDevice::with_state(playing("file:///a.mp3"));
        reconcile(&device, PlayStatus::Paused, Some("file:///a.mp3")).unwrap();
        assert_eq!(device.calls(), vec!["pause"]);

        let device = FakeDevice::with_state(paused("file:///a.mp3"));
        reconcile(&device, PlayStatus::Paused, Some("file:///a.mp3")).unwrap();
        assert!(device.calls().is_empty());
    }

    #[test]
    fn stop_only_when_loaded() {
        let device = FakeDevice::with_state(paused("file:///a.mp3"));
        reconcile(&device, PlayStatus::Stopped, None).unwrap();
        assert_eq!(device.calls(), vec!["stop"]);

        let device = FakeDevice::new();
        reconcile(&device, PlayStatus::Stopped, None).unwrap();
        assert!(device.calls().is_empty());
    }

    #[test]
    fn playing_without_url_stops() {
        let device = FakeDevice::with_state(playing("file:///a.mp3"));
        reconcile(&device, PlayStatus::Playing, None).unwrap();

        assert_eq!(device.calls(), vec!["stop"]);
    }

    #[test]
    fn finished_track_is_cleared_before_deciding() {
        let mut finished = playing("file:///a.mp3");
        finished.position = finished.duration;
        let device = FakeDevice::with_state(finished);

        let info = reconcile(&device, PlayStatus::Playing, Some("file:///b.mp3")).unwrap();

        // stop d'abord (purge fin de piste), puis chargement du suivant
        assert_eq!(device.calls(), vec!["stop", "play file:///b.mp3"]);
        assert_eq!(info.url.as_deref(), Some("file:///b.mp3"));
    }

    #[test]
    fn settle_info_passes_through_normal_state() {
        let device = FakeDevice::with_state(playing("file:///a.mp3"));
        let info = settle_info(&device).unwrap();

        assert!(device.calls().is_empty());
        assert!(info.isplaying);
    }
}
