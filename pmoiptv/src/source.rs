//! Sources de playlists : upload HTTP et fichier local
//!
//! Ces fonctions appliquent les contrôles qui précèdent l'analyse
//! (extension, taille maximale) ; le contenu retourné est ensuite confié à
//! [`PlaylistParser`](crate::PlaylistParser).

use crate::error::SourceError;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Taille maximale par défaut d'une playlist (2 Mio)
pub const DEFAULT_MAX_PLAYLIST_SIZE: u64 = 2 * 1024 * 1024;

/// Extensions acceptées pour un upload
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["m3u", "m3u8"];

/// Vérifie que `filename` se termine par `.m3u` ou `.m3u8` (casse ignorée)
pub fn check_extension(filename: &str) -> Result<(), SourceError> {
    let accepted = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
        .unwrap_or(false);

    if accepted {
        Ok(())
    } else {
        Err(SourceError::InvalidExtension(filename.to_string()))
    }
}

/// Vérifie qu'une taille annoncée ou mesurée respecte le plafond
pub fn check_size(size: u64, max: u64) -> Result<(), SourceError> {
    if size > max {
        Err(SourceError::SizeLimitExceeded { size, max })
    } else {
        Ok(())
    }
}

/// Accumulateur d'upload découpé en morceaux
///
/// Le dépassement du plafond est détecté dès le morceau fautif, avant
/// d'avoir reçu tout le corps de la requête ; le tampon est alors vidé.
#[derive(Debug)]
pub struct UploadBuffer {
    filename: String,
    max_size: u64,
    data: Vec<u8>,
}

impl UploadBuffer {
    /// Démarre un upload après vérification de l'extension
    pub fn begin(filename: &str, max_size: u64) -> Result<Self, SourceError> {
        check_extension(filename)?;
        tracing::debug!(filename, max_size, "Playlist upload started");
        Ok(Self {
            filename: filename.to_string(),
            max_size,
            data: Vec::new(),
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Octets reçus jusqu'ici
    pub fn received(&self) -> u64 {
        self.data.len() as u64
    }

    /// Ajoute un morceau reçu
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<(), SourceError> {
        let size = self.received() + chunk.len() as u64;
        if let Err(e) = check_size(size, self.max_size) {
            tracing::warn!(filename = %self.filename, size, "Playlist upload too large");
            self.data = Vec::new();
            return Err(e);
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    /// Termine l'upload et retourne le texte reçu
    ///
    /// Les séquences UTF-8 invalides sont remplacées par `U+FFFD`.
    pub fn finish(self) -> String {
        tracing::debug!(
            filename = %self.filename,
            bytes = self.data.len(),
            "Playlist upload completed"
        );
        match String::from_utf8(self.data) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

/// Lit un fichier de playlist en refusant ceux qui dépassent `max_size`
///
/// # Errors
///
/// - [`SourceError::StorageUnavailable`] si le fichier n'existe pas
/// - [`SourceError::SizeLimitExceeded`] si le fichier est trop gros
/// - [`SourceError::Io`] pour toute autre erreur de lecture
pub fn read_playlist_file(path: &Path, max_size: u64) -> Result<String, SourceError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SourceError::StorageUnavailable(format!(
                "playlist file not found: {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    check_size(metadata.len(), max_size)?;

    // Le fichier peut grossir entre metadata() et la lecture
    let mut data = Vec::new();
    fs::File::open(path)?
        .take(max_size.saturating_add(1))
        .read_to_end(&mut data)?;
    check_size(data.len() as u64, max_size)?;

    tracing::debug!(path = %path.display(), bytes = data.len(), "Playlist file read");

    Ok(match String::from_utf8(data) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_extension() {
        assert!(check_extension("list.m3u").is_ok());
        assert!(check_extension("list.m3u8").is_ok());
        assert!(check_extension("LIST.M3U8").is_ok());
        assert!(matches!(
            check_extension("list.txt"),
            Err(SourceError::InvalidExtension(_))
        ));
        assert!(check_extension("m3u8").is_err());
        assert!(check_extension("").is_err());
    }

    #[test]
    fn test_check_size() {
        assert!(check_size(10, 10).is_ok());
        assert!(matches!(
            check_size(11, 10),
            Err(SourceError::SizeLimitExceeded { size: 11, max: 10 })
        ));
    }

    #[test]
    fn test_upload_rejects_bad_extension() {
        assert!(UploadBuffer::begin("playlist.json", 100).is_err());
    }

    #[test]
    fn test_upload_chunks() {
        let mut upload = UploadBuffer::begin("playlist.m3u", 100).unwrap();
        upload.push_chunk(b"#EXTM3U\n").unwrap();
        upload.push_chunk(b"#EXTINF:-1,A\n").unwrap();
        assert_eq!(upload.received(), 21);
        assert_eq!(upload.finish(), "#EXTM3U\n#EXTINF:-1,A\n");
    }

    #[test]
    fn test_upload_size_limit() {
        let mut upload = UploadBuffer::begin("playlist.m3u8", 10).unwrap();
        upload.push_chunk(b"12345").unwrap();
        upload.push_chunk(b"12345").unwrap();
        let err = upload.push_chunk(b"1").unwrap_err();
        assert!(matches!(err, SourceError::SizeLimitExceeded { size: 11, max: 10 }));
        assert_eq!(upload.received(), 0);
    }

    #[test]
    fn test_upload_invalid_utf8_is_replaced() {
        let mut upload = UploadBuffer::begin("playlist.m3u", 100).unwrap();
        upload.push_chunk(&[b'a', 0xff, b'b']).unwrap();
        assert_eq!(upload.finish(), "a\u{fffd}b");
    }
}
