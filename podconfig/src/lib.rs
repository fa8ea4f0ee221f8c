//! # PodRemote Configuration Module
//!
//! This module provides configuration management for PodRemote, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use podconfig::get_config;
//!
//! // Get the global configuration
//! let config = get_config();
//!
//! // Access configuration values
//! let port = config.get_http_port();
//! let music_dir = config.get_music_dir()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use podutils::guess_local_ip;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("podremote.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load PodRemote configuration"));
}

const ENV_CONFIG_DIR: &str = "PODREMOTE_CONFIG";
const ENV_PREFIX: &str = "PODREMOTE_CONFIG__";

// Default values for configuration
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_DEVICE_PORT: u16 = 45001;
const DEFAULT_MUSIC_DIR: &str = "/sdcard/Music";
const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "wma", "flac"];
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Macro to generate getter/setter for u16 values with default
macro_rules! impl_port_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> u16 {
            match self.get_value($path) {
                Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap() as u16,
                Ok(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap() as u16,
                Ok(Value::String(s)) => s.parse::<u16>().unwrap_or($default),
                _ => $default,
            }
        }

        pub fn $setter(&self, port: u16) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(port)))
        }
    };
}

/// Configuration manager for PodRemote
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing typed getters/setters for configuration values
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(".podremote").exists() {
            return ".podremote".to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(".podremote");
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        ".podremote".to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("Le chemin spécifié n'est pas un répertoire"));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PODREMOTE_CONFIG` environment variable
    /// 3. `.podremote` in the current directory
    /// 4. `.podremote` in the user's home directory
    pub fn config_dir(directory: &str) -> String {
        let dir_path = Self::find_config_dir(directory);
        let path = Path::new(&dir_path);

        Self::validate_config_dir(path)
            .expect("Impossible de valider le répertoire de configuration");

        dir_path
    }

    /// Loads the configuration from the specified directory
    ///
    /// Merges the embedded default configuration with the external
    /// config.yaml (if present), applies environment variable overrides,
    /// then persists the merged result.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory);
        info!(config_dir=%config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file=%path, "Loaded config file");
            data
        } else {
            info!(config_file=%path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        let external_value: Value = serde_yaml::from_slice(&yaml_data)?;
        merge_yaml(&mut default_value, &external_value);
        let mut config_value = Self::lower_keys_value(default_value);

        Self::apply_env_overrides(&mut config_value);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let data = self.data.lock().unwrap();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        Self::set_value_internal(&mut data, path, value)?;
        drop(data);
        self.save()?;
        Ok(())
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key = path[0].to_lowercase();
            let key_value = Value::String(key.clone());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock().unwrap();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                let key = key.to_lowercase();

                if let Some(next) = map.get(&Value::String(key)) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if key.starts_with(ENV_PREFIX) {
                let key_path = key
                    .trim_start_matches(ENV_PREFIX)
                    .split("__")
                    .collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        let new_key = Value::String(s.to_lowercase());
                        new_map.insert(new_key, Self::lower_keys_value(v));
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Gets the base URL for the HTTP server
    ///
    /// Returns the configured base URL, or guesses the local IP address if
    /// not configured.
    pub fn get_base_url(&self) -> String {
        match self.get_value(&["host", "base_url"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => guess_local_ip(),
        }
    }

    pub fn set_base_url(&self, url: &str) -> Result<()> {
        self.set_value(&["host", "base_url"], Value::String(url.to_string()))
    }

    impl_port_config!(
        get_http_port,
        set_http_port,
        &["host", "http_port"],
        DEFAULT_HTTP_PORT
    );

    impl_port_config!(
        get_device_port,
        set_device_port,
        &["device", "port"],
        DEFAULT_DEVICE_PORT
    );

    /// Host of the SL4A RPC facade
    pub fn get_device_host(&self) -> String {
        match self.get_value(&["device", "host"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => "127.0.0.1".to_string(),
        }
    }

    /// AP_HANDSHAKE secret for the SL4A facade, if one is configured
    pub fn get_device_handshake(&self) -> Option<String> {
        match self.get_value(&["device", "handshake"]) {
            Ok(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Root directory of the music library
    ///
    /// The directory is created if it does not exist.
    pub fn get_music_dir(&self) -> Result<String> {
        let dir = match self.get_value(&["music", "directory"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_MUSIC_DIR.to_string(),
        };
        let path = Path::new(&dir);
        if !path.exists() {
            fs::create_dir_all(path)?;
            info!(directory=%path.display(), "Created music directory");
        }
        Ok(dir)
    }

    pub fn set_music_dir(&self, dir: &str) -> Result<()> {
        self.set_value(&["music", "directory"], Value::String(dir.to_string()))
    }

    /// Extensions recognized as playable audio (lowercase, without dot)
    pub fn get_audio_extensions(&self) -> Vec<String> {
        match self.get_value(&["music", "extensions"]) {
            Ok(Value::Sequence(seq)) => {
                let exts: Vec<String> = seq
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s.trim_start_matches('.').to_lowercase()),
                        _ => None,
                    })
                    .collect();
                if exts.is_empty() {
                    Self::default_extensions()
                } else {
                    exts
                }
            }
            _ => Self::default_extensions(),
        }
    }

    fn default_extensions() -> Vec<String> {
        DEFAULT_AUDIO_EXTENSIONS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Minimum log level ("TRACE", "DEBUG", "INFO", "WARN", "ERROR")
    pub fn get_log_min_level(&self) -> String {
        match self.get_value(&["logs", "min_level"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_LOG_MIN_LEVEL.to_string(),
        }
    }

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["logs", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Returns the configuration directory in use
    pub fn get_config_dir(&self) -> &str {
        &self.config_dir
    }
}

// Implémentation manuelle de Clone (Mutex n'est pas Clone)
impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.data.lock().unwrap().clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

/// Fusionne récursivement deux valeurs YAML (b écrase a)
fn merge_yaml(a: &mut Value, b: &Value) {
    match (a, b) {
        (Value::Mapping(a_map), Value::Mapping(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(k) {
                    merge_yaml(a_val, v);
                } else {
                    a_map.insert(k.clone(), v.clone());
                }
            }
        }
        (a_slot, b_val) => {
            *a_slot = b_val.clone();
        }
    }
}

/// Returns the global configuration singleton
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config() -> (TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn defaults_are_loaded() {
        let (_dir, config) = test_config();
        assert_eq!(config.get_http_port(), 8080);
        assert_eq!(config.get_device_port(), 45001);
        assert_eq!(config.get_device_host(), "127.0.0.1");
        assert_eq!(config.get_device_handshake(), None);
        assert_eq!(config.get_log_min_level(), "INFO");
        assert!(config.get_log_enable_console());
    }

    #[test]
    fn audio_extensions_default_set() {
        let (_dir, config) = test_config();
        let exts = config.get_audio_extensions();
        assert_eq!(exts, vec!["mp3", "ogg", "wma", "flac"]);
    }

    #[test]
    fn set_value_roundtrip() {
        let (_dir, config) = test_config();
        config.set_http_port(9090).unwrap();
        assert_eq!(config.get_http_port(), 9090);
    }

    #[test]
    fn get_value_unknown_path_fails() {
        let (_dir, config) = test_config();
        assert!(config.get_value(&["no", "such", "path"]).is_err());
    }

    #[test]
    fn merge_yaml_overrides_scalars_keeps_missing() {
        let mut a: Value = serde_yaml::from_str("x: 1\ny: 2").unwrap();
        let b: Value = serde_yaml::from_str("y: 3").unwrap();
        merge_yaml(&mut a, &b);
        let map = a.as_mapping().unwrap();
        assert_eq!(map[&Value::String("x".into())], Value::Number(1.into()));
        assert_eq!(map[&Value::String("y".into())], Value::Number(3.into()));
    }
}
