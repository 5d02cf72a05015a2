//! # PMOIptv Configuration Module
//!
//! This module provides configuration management for PMOIptv, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Path-based getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! use serde_yaml::Value;
//!
//! // Get the global configuration
//! let config = get_config();
//!
//! // Access configuration values
//! let max_channels = config.get_value(&["playlist", "max_channels"])?;
//!
//! // Update configuration values
//! config.set_value(&["playlist", "max_channels"], Value::from(200))?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Les crates métier (ex: `pmoiptv`) ajoutent leurs propres clés via des
//! traits d'extension sur [`Config`] plutôt que de modifier ce module.

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmoiptv.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> = Arc::new(Config::load_or_default(""));
}

const ENV_CONFIG_DIR: &str = "PMOIPTV_CONFIG";
const ENV_PREFIX: &str = "PMOIPTV_CONFIG__";
const CONFIG_DIR_NAME: &str = ".pmoiptv";

/// Configuration manager for PMOIptv
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing path-based getters/setters for configuration values
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

// Implémentation manuelle de Clone
impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.lock().clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    fn lock(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

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
        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        CONFIG_DIR_NAME.to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        // Create if doesn't exist
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        // Verify it's a directory
        if !path.is_dir() {
            return Err(anyhow!(
                "Le chemin spécifié n'est pas un répertoire: {}",
                path.display()
            ));
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
    /// 2. The `PMOIPTV_CONFIG` environment variable
    /// 3. `.pmoiptv` in the current directory
    /// 4. `.pmoiptv` in the user's home directory
    ///
    /// The directory is created if it doesn't exist, and validated for write permission.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the config.yaml file, or empty to use defaults
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir=%config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut config_value = Self::lower_keys_value(serde_yaml::from_str(DEFAULT_CONFIG)?);

        // Un fichier absent ou vide laisse la configuration par défaut intacte
        if let Ok(data) = fs::read(&path) {
            info!(config_file=%path, "Loaded config file");
            let external_value: Value = serde_yaml::from_slice(&data)?;
            merge_yaml(&mut config_value, &Self::lower_keys_value(external_value));
        } else {
            info!(config_file=%path, "Config file not found, using default embedded config");
        }

        Self::apply_env_overrides(&mut config_value);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    /// Charge la configuration, ou retombe sur la configuration intégrée
    /// (sans fichier associé) si le répertoire n'est pas utilisable.
    fn load_or_default(directory: &str) -> Self {
        match Self::load_config(directory) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load configuration: {}, using embedded defaults", e);
                Self::embedded()
            }
        }
    }

    /// Configuration en mémoire construite uniquement depuis les valeurs
    /// intégrées; `save()` n'écrit rien tant qu'aucun chemin n'est associé.
    pub fn embedded() -> Self {
        let value = serde_yaml::from_str::<Value>(DEFAULT_CONFIG)
            .map(Self::lower_keys_value)
            .unwrap_or(Value::Mapping(Mapping::new()));
        Config {
            config_dir: String::new(),
            path: String::new(),
            data: Mutex::new(value),
        }
    }

    /// Répertoire de configuration effectivement utilisé
    pub fn dir(&self) -> &str {
        &self.config_dir
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        if self.path.is_empty() {
            return Ok(());
        }
        let data = self.lock();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["playlist", "max_size"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.lock();
        Self::set_value_internal(&mut data, path, value)?;
        drop(data);
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        let Some((first, rest)) = path.split_first() else {
            *data = value;
            return Ok(());
        };
        if let Value::Mapping(map) = data {
            let key_value = Value::String(first.to_lowercase());
            if rest.is_empty() {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                // Un scalaire intermédiaire (ex: null) est remplacé par une map
                if !entry.is_mapping() {
                    *entry = Value::Mapping(Mapping::new());
                }
                Self::set_value_internal(entry, rest, value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock();
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
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                if let Err(e) = Self::set_value_internal(config, &key_path, yaml_value) {
                    tracing::warn!(env_var=%key, "Ignoring environment override: {}", e);
                }
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
                    let new_key = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    new_map.insert(new_key, Self::lower_keys_value(v));
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Résout un chemin de fichier géré par la configuration
    ///
    /// Le chemin configuré peut être absolu ou relatif au répertoire de
    /// configuration. Si la clé n'existe pas, `default` est enregistré.
    ///
    /// # Exemple
    ///
    /// ```no_run
    /// use pmoconfig::get_config;
    ///
    /// let config = get_config();
    /// let path = config.get_managed_file(&["playlist", "file"], "playlist.m3u8")?;
    /// println!("Playlist file: {}", path.display());
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn get_managed_file(&self, path: &[&str], default: &str) -> Result<PathBuf> {
        let file = match self.get_value(path) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => {
                self.set_value(path, Value::String(default.to_string()))?;
                default.to_string()
            }
        };

        let file_path = Path::new(&file);
        if file_path.is_absolute() {
            Ok(file_path.to_path_buf())
        } else {
            Ok(Path::new(&self.config_dir).join(file_path))
        }
    }
}

/// Returns the global configuration instance
///
/// This function provides access to the singleton configuration instance,
/// which is lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// - For mappings (objects), it merges keys from external into default
/// - For scalars and sequences, external values replace default values
/// - A null external document (empty file) leaves default untouched
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (_, Value::Null) => {}
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Number;

    #[test]
    fn test_load_creates_config_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_str().unwrap();

        let config = Config::load_config(dir).unwrap();
        assert_eq!(config.dir(), dir);
        assert!(temp_dir.path().join("config.yaml").exists());
    }

    #[test]
    fn test_embedded_defaults() {
        let config = Config::embedded();
        assert_eq!(config.dir(), "");
        assert_eq!(
            config.get_value(&["playlist", "max_channels"]).unwrap(),
            Value::Number(Number::from(500))
        );
        // Aucun fichier associé : save() ne fait rien
        config
            .set_value(&["playlist", "max_channels"], Value::Number(Number::from(20)))
            .unwrap();
        assert_eq!(
            config.get_value(&["playlist", "max_channels"]).unwrap(),
            Value::Number(Number::from(20))
        );
    }

    #[test]
    fn test_user_file_is_merged() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join("config.yaml"),
            "playlist:\n  MAX_CHANNELS: 42\n",
        )
        .unwrap();

        let config = Config::load_config(temp_dir.path().to_str().unwrap()).unwrap();
        assert_eq!(
            config.get_value(&["playlist", "max_channels"]).unwrap(),
            Value::Number(Number::from(42))
        );
        // Les autres valeurs par défaut sont conservées
        assert_eq!(
            config.get_value(&["playlist", "file"]).unwrap(),
            Value::String("playlist.m3u8".into())
        );
    }

    #[test]
    fn test_set_value_is_persisted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_str().unwrap();

        let config = Config::load_config(dir).unwrap();
        config
            .set_value(&["playlist", "Max_Channels"], Value::Number(Number::from(42)))
            .unwrap();

        let reloaded = Config::load_config(dir).unwrap();
        assert_eq!(
            reloaded.get_value(&["playlist", "max_channels"]).unwrap(),
            Value::Number(Number::from(42))
        );
    }

    #[test]
    fn test_get_missing_path() {
        let config = Config::embedded();
        assert!(config.get_value(&["does", "not", "exist"]).is_err());
    }

    #[test]
    fn test_set_value_replaces_scalar_node() {
        let config = Config::embedded();
        config.set_value(&["a"], Value::Null).unwrap();
        config
            .set_value(&["a", "b"], Value::Bool(true))
            .unwrap();
        assert_eq!(config.get_value(&["a", "b"]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_managed_file_relative_to_config_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(temp_dir.path().to_str().unwrap()).unwrap();

        let path = config
            .get_managed_file(&["test", "file"], "data.txt")
            .unwrap();
        assert_eq!(path, temp_dir.path().join("data.txt"));
    }

    #[test]
    fn test_merge_yaml_null_keeps_default() {
        let mut default: Value = serde_yaml::from_str("a: 1").unwrap();
        merge_yaml(&mut default, &Value::Null);
        assert_eq!(default, serde_yaml::from_str::<Value>("a: 1").unwrap());
    }

    #[test]
    fn test_lower_keys() {
        let value: Value = serde_yaml::from_str("Playlist:\n  Max_Size: 1").unwrap();
        let lowered = Config::lower_keys_value(value);
        assert_eq!(
            Config::get_value_internal(&lowered, &["playlist", "max_size"]).unwrap(),
            Value::Number(Number::from(1))
        );
    }
}
