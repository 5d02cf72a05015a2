//! Types d'erreurs pour pmoiptv

use std::io;

/// Échec d'analyse d'une playlist complète
///
/// Seules les conditions portant sur l'ensemble du document produisent une
/// erreur : une entrée isolée invalide est simplement ignorée par le parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Empty playlist content")]
    EmptyInput,

    #[error("Missing #EXTM3U header")]
    MissingHeader,

    #[error("No valid channel found in playlist")]
    NoValidChannels,
}

/// Erreurs côté source (upload, lecture de fichier)
///
/// Elles sont levées avant que le contenu n'atteigne le parser.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Playlist too large: {size} bytes (maximum {max})")]
    SizeLimitExceeded { size: u64, max: u64 },

    #[error("Invalid playlist extension: {0} (expected .m3u or .m3u8)")]
    InvalidExtension(String),

    #[error("Playlist storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Erreurs de pmoiptv
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

/// Type Result spécialisé pour pmoiptv
pub type Result<T> = std::result::Result<T, Error>;
