//! Extension de pmoconfig pour le catalogue IPTV
//!
//! Toutes les bornes du parser, de la projection JSON et des sources sont
//! lues dans la section `playlist` de la configuration :
//!
//! ```yaml
//! playlist:
//!   file: playlist.m3u8
//!   max_size: 2097152
//!   max_channels: 500
//!   max_name_length: 128
//!   max_url_length: 512
//!   max_logo_length: 256
//!   max_group_length: 128
//!   max_json_size: 65536
//! ```
//!
//! Les getters persistent automatiquement la valeur par défaut dans la
//! configuration si la clé n'existe pas encore.
//!
//! # Exemple
//!
//! ```no_run
//! use pmoconfig::get_config;
//! use pmoiptv::{Catalog, IptvConfigExt};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! let catalog = Catalog::new(config.catalog_json()?);
//!
//! let count = config.reload_catalog(&catalog)?;
//! println!("{} channels loaded", count);
//! # Ok(())
//! # }
//! ```

use crate::catalog::Catalog;
use crate::json::{CatalogJson, DEFAULT_MAX_JSON_SIZE};
use crate::parser::{
    ParserLimits, PlaylistParser, DEFAULT_MAX_CHANNELS, DEFAULT_MAX_GROUP_LENGTH, DEFAULT_MAX_LOGO_LENGTH,
    DEFAULT_MAX_NAME_LENGTH, DEFAULT_MAX_URL_LENGTH,
};
use crate::source::DEFAULT_MAX_PLAYLIST_SIZE;
use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::{Number, Value};
use std::path::PathBuf;

/// Nom par défaut du fichier de playlist
pub const DEFAULT_PLAYLIST_FILE: &str = "playlist.m3u8";

/// Lit un entier de la section `playlist`, ou persiste `default`
fn get_playlist_u64(config: &Config, key: &str, default: u64) -> Result<u64> {
    match config.get_value(&["playlist", key]) {
        Ok(Value::Number(n)) => match n.as_u64() {
            Some(value) => return Ok(value),
            None => tracing::warn!(key, "Invalid playlist setting {}, using default {}", n, default),
        },
        Ok(Value::Null) | Err(_) => {}
        Ok(_) => tracing::warn!(key, "Playlist setting is not a number, using default {}", default),
    }

    set_playlist_u64(config, key, default)?;
    Ok(default)
}

fn set_playlist_u64(config: &Config, key: &str, value: u64) -> Result<()> {
    config.set_value(&["playlist", key], Value::Number(Number::from(value)))
}

fn get_playlist_usize(config: &Config, key: &str, default: usize) -> Result<usize> {
    let value = get_playlist_u64(config, key, default as u64)?;
    Ok(usize::try_from(value).unwrap_or(usize::MAX))
}

/// Trait d'extension pour pmoconfig::Config
pub trait IptvConfigExt {
    /// Chemin du fichier de playlist (relatif au répertoire de configuration)
    fn playlist_path(&self) -> Result<PathBuf>;

    /// Taille maximale d'une playlist en octets (défaut 2 Mio)
    fn get_playlist_max_size(&self) -> Result<u64>;
    fn set_playlist_max_size(&self, bytes: u64) -> Result<()>;

    /// Nombre maximal de chaînes (défaut 500)
    fn get_playlist_max_channels(&self) -> Result<usize>;
    fn set_playlist_max_channels(&self, count: usize) -> Result<()>;

    fn get_playlist_max_name_length(&self) -> Result<usize>;
    fn set_playlist_max_name_length(&self, length: usize) -> Result<()>;

    fn get_playlist_max_url_length(&self) -> Result<usize>;
    fn set_playlist_max_url_length(&self, length: usize) -> Result<()>;

    fn get_playlist_max_logo_length(&self) -> Result<usize>;
    fn set_playlist_max_logo_length(&self, length: usize) -> Result<()>;

    fn get_playlist_max_group_length(&self) -> Result<usize>;
    fn set_playlist_max_group_length(&self, length: usize) -> Result<()>;

    /// Taille maximale du document JSON (défaut 64 Kio, 0 = illimité)
    fn get_playlist_max_json_size(&self) -> Result<usize>;
    fn set_playlist_max_json_size(&self, bytes: usize) -> Result<()>;

    /// Limites complètes du parser
    fn parser_limits(&self) -> Result<ParserLimits>;

    /// Sérialiseur JSON configuré
    fn catalog_json(&self) -> Result<CatalogJson>;

    /// Recharge `catalog` depuis le fichier de playlist configuré
    ///
    /// Les erreurs de configuration sont remontées en [`crate::Error::Config`].
    fn reload_catalog(&self, catalog: &Catalog) -> crate::Result<usize>;
}

impl IptvConfigExt for Config {
    fn playlist_path(&self) -> Result<PathBuf> {
        self.get_managed_file(&["playlist", "file"], DEFAULT_PLAYLIST_FILE)
    }

    fn get_playlist_max_size(&self) -> Result<u64> {
        get_playlist_u64(self, "max_size", DEFAULT_MAX_PLAYLIST_SIZE)
    }

    fn set_playlist_max_size(&self, bytes: u64) -> Result<()> {
        set_playlist_u64(self, "max_size", bytes)
    }

    fn get_playlist_max_channels(&self) -> Result<usize> {
        get_playlist_usize(self, "max_channels", DEFAULT_MAX_CHANNELS)
    }

    fn set_playlist_max_channels(&self, count: usize) -> Result<()> {
        set_playlist_u64(self, "max_channels", count as u64)
    }

    fn get_playlist_max_name_length(&self) -> Result<usize> {
        get_playlist_usize(self, "max_name_length", DEFAULT_MAX_NAME_LENGTH)
    }

    fn set_playlist_max_name_length(&self, length: usize) -> Result<()> {
        set_playlist_u64(self, "max_name_length", length as u64)
    }

    fn get_playlist_max_url_length(&self) -> Result<usize> {
        get_playlist_usize(self, "max_url_length", DEFAULT_MAX_URL_LENGTH)
    }

    fn set_playlist_max_url_length(&self, length: usize) -> Result<()> {
        set_playlist_u64(self, "max_url_length", length as u64)
    }

    fn get_playlist_max_logo_length(&self) -> Result<usize> {
        get_playlist_usize(self, "max_logo_length", DEFAULT_MAX_LOGO_LENGTH)
    }

    fn set_playlist_max_logo_length(&self, length: usize) -> Result<()> {
        set_playlist_u64(self, "max_logo_length", length as u64)
    }

    fn get_playlist_max_group_length(&self) -> Result<usize> {
        get_playlist_usize(self, "max_group_length", DEFAULT_MAX_GROUP_LENGTH)
    }

    fn set_playlist_max_group_length(&self, length: usize) -> Result<()> {
        set_playlist_u64(self, "max_group_length", length as u64)
    }

    fn get_playlist_max_json_size(&self) -> Result<usize> {
        get_playlist_usize(self, "max_json_size", DEFAULT_MAX_JSON_SIZE)
    }

    fn set_playlist_max_json_size(&self, bytes: usize) -> Result<()> {
        set_playlist_u64(self, "max_json_size", bytes as u64)
    }

    fn parser_limits(&self) -> Result<ParserLimits> {
        Ok(ParserLimits {
            max_channels: self.get_playlist_max_channels()?,
            max_name_length: self.get_playlist_max_name_length()?,
            max_url_length: self.get_playlist_max_url_length()?,
            max_logo_length: self.get_playlist_max_logo_length()?,
            max_group_length: self.get_playlist_max_group_length()?,
        })
    }

    fn catalog_json(&self) -> Result<CatalogJson> {
        Ok(match self.get_playlist_max_json_size()? {
            0 => CatalogJson::unbounded(),
            limit => CatalogJson::with_limit(limit),
        })
    }

    fn reload_catalog(&self, catalog: &Catalog) -> crate::Result<usize> {
        let parser = PlaylistParser::new(self.parser_limits()?);
        let path = self.playlist_path()?;
        let max_size = self.get_playlist_max_size()?;
        catalog.load_file(&parser, &path, max_size)
    }
}
