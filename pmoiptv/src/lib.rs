//! # pmoiptv - Catalogue de chaînes IPTV à partir de playlists M3U
//!
//! Cette crate transforme une playlist texte (`#EXTM3U` / `#EXTINF`) en un
//! catalogue de chaînes validé, borné et interrogeable :
//! - Parser M3U tolérant (une entrée invalide n'invalide pas le document)
//! - Catalogue remplacé atomiquement, sûr pour des lecteurs concurrents
//! - Recherche par nom insensible à la casse
//! - Projection JSON bornée en taille
//! - Contrôles d'upload et de lecture de fichier (extension, taille)
//!
//! # Architecture
//!
//! - **PlaylistParser** : analyse sans état, bornée par [`ParserLimits`]
//! - **Catalog** : génération courante des chaînes, interrogée par la couche HTTP
//! - **CatalogJson** : sérialisation `{"channels": [...], "total": N}`
//! - **UploadBuffer** / **read_playlist_file** : sources de texte
//!
//! Le transport réseau, le stockage et le routage HTTP restent à la charge
//! de l'application.
//!
//! # Exemple d'utilisation
//!
//! ```
//! use pmoiptv::{Catalog, ParserLimits, PlaylistParser};
//!
//! let parser = PlaylistParser::new(ParserLimits::default());
//! let catalog = Catalog::default();
//!
//! let text = "#EXTM3U\n\
//!             #EXTINF:-1 tvg-logo=\"http://x/a.png\" group-title=\"News\",Channel A\n\
//!             http://stream.example/a\n";
//!
//! catalog.load(&parser, text)?;
//!
//! let channel = catalog.at(0).unwrap();
//! assert_eq!(channel.name(), "Channel A");
//! assert_eq!(channel.group(), "News");
//! println!("{}", catalog.to_json());
//! # Ok::<(), pmoiptv::ParseError>(())
//! ```

mod catalog;
mod channel;
mod error;
mod json;
mod parser;
mod source;

#[cfg(feature = "pmoconfig")]
mod config_ext;

// Réexports publics
pub use catalog::{Catalog, CatalogSnapshot, CatalogStatus};
pub use channel::Channel;
pub use error::{Error, ParseError, Result, SourceError};
pub use json::{CatalogJson, DEFAULT_MAX_JSON_SIZE};
pub use parser::{
    extract_attribute, extract_channel_name, is_valid_url, ParsedPlaylist, ParserLimits,
    PlaylistParser, DEFAULT_MAX_CHANNELS, DEFAULT_MAX_GROUP_LENGTH, DEFAULT_MAX_LOGO_LENGTH,
    DEFAULT_MAX_NAME_LENGTH, DEFAULT_MAX_URL_LENGTH, EXTINF_MARKER, HEADER_MARKER,
};
pub use source::{
    check_extension, check_size, read_playlist_file, UploadBuffer, ACCEPTED_EXTENSIONS,
    DEFAULT_MAX_PLAYLIST_SIZE,
};

#[cfg(feature = "pmoconfig")]
pub use config_ext::{IptvConfigExt, DEFAULT_PLAYLIST_FILE};
