//! Parser de playlists M3U / M3U8
//!
//! Format supporté :
//!
//! ```text
//! #EXTM3U
//! #EXTINF:-1 tvg-logo="url" group-title="Groupe",Nom de la chaîne
//! http://url.du.flux
//! ```
//!
//! L'analyse est une machine à deux états sur les lignes du document
//! (`\n`, `\r\n` et `\r` sont traités de la même façon). Une entrée invalide
//! (URL absente ou non HTTP, URL trop longue) est ignorée individuellement ;
//! seuls un document vide, un en-tête absent ou l'absence totale de chaîne
//! valide font échouer l'analyse.

use crate::channel::Channel;
use crate::error::ParseError;
use tracing::{debug, info, warn};

/// Marqueur d'en-tête obligatoire
pub const HEADER_MARKER: &str = "#EXTM3U";

/// Préfixe des lignes de métadonnées
pub const EXTINF_MARKER: &str = "#EXTINF:";

pub const DEFAULT_MAX_CHANNELS: usize = 500;
pub const DEFAULT_MAX_NAME_LENGTH: usize = 128;
pub const DEFAULT_MAX_URL_LENGTH: usize = 512;
pub const DEFAULT_MAX_LOGO_LENGTH: usize = 256;
pub const DEFAULT_MAX_GROUP_LENGTH: usize = 128;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Bornes appliquées pendant l'analyse
///
/// Les longueurs de nom et de groupe sont comptées en caractères, celles des
/// URL en octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    pub max_channels: usize,
    pub max_name_length: usize,
    pub max_url_length: usize,
    pub max_logo_length: usize,
    pub max_group_length: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_channels: DEFAULT_MAX_CHANNELS,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_url_length: DEFAULT_MAX_URL_LENGTH,
            max_logo_length: DEFAULT_MAX_LOGO_LENGTH,
            max_group_length: DEFAULT_MAX_GROUP_LENGTH,
        }
    }
}

impl ParserLimits {
    /// Limites par défaut avec un nombre maximal de chaînes différent
    pub fn with_max_channels(max_channels: usize) -> Self {
        Self {
            max_channels,
            ..Self::default()
        }
    }
}

/// Résultat d'une analyse réussie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPlaylist {
    channels: Vec<Channel>,
    skipped: usize,
    truncated: bool,
}

impl ParsedPlaylist {
    /// Chaînes acceptées, dans l'ordre du document
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Channel> {
        self.channels
    }

    /// Nombre de chaînes acceptées
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Nombre d'entrées `#EXTINF` écartées (URL absente, invalide ou trop longue)
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Vrai si l'analyse s'est arrêtée sur la limite du nombre de chaînes
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// État de la machine d'analyse
#[derive(Debug, Clone, Copy)]
enum ScanState<'a> {
    AwaitingInfo,
    AwaitingUrl(&'a str),
}

/// Parser de playlists, sans état entre deux appels
#[derive(Debug, Clone, Default)]
pub struct PlaylistParser {
    limits: ParserLimits,
}

impl PlaylistParser {
    /// Crée un parser avec les limites données
    pub fn new(limits: ParserLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ParserLimits {
        &self.limits
    }

    /// Analyse le contenu complet d'une playlist
    ///
    /// # Errors
    ///
    /// - [`ParseError::EmptyInput`] si `text` est vide
    /// - [`ParseError::MissingHeader`] si le document ne commence pas par `#EXTM3U`
    /// - [`ParseError::NoValidChannels`] si aucune chaîne n'a été retenue
    pub fn parse(&self, text: &str) -> Result<ParsedPlaylist, ParseError> {
        debug!(bytes = text.len(), "Starting playlist parse");

        if text.is_empty() {
            warn!("Playlist content is empty");
            return Err(ParseError::EmptyInput);
        }

        if !has_header(text) {
            warn!("Playlist header {} not found", HEADER_MARKER);
            return Err(ParseError::MissingHeader);
        }

        let mut channels: Vec<Channel> = Vec::new();
        let mut skipped = 0usize;
        let mut truncated = false;
        let mut state = ScanState::AwaitingInfo;

        for line in split_lines(text) {
            match state {
                _ if line.starts_with(EXTINF_MARKER) => {
                    if let ScanState::AwaitingUrl(previous) = state {
                        debug!(line = previous, "Metadata line without stream URL discarded");
                        skipped += 1;
                    }
                    state = ScanState::AwaitingUrl(line);
                }
                ScanState::AwaitingInfo => {}
                ScanState::AwaitingUrl(_) if line.starts_with('#') => {}
                ScanState::AwaitingUrl(info) => {
                    state = ScanState::AwaitingInfo;

                    if !is_valid_url(line) {
                        debug!(url = line, "Invalid stream URL, entry skipped");
                        skipped += 1;
                        continue;
                    }

                    if line.len() > self.limits.max_url_length {
                        debug!(
                            length = line.len(),
                            max = self.limits.max_url_length,
                            "Stream URL too long, entry skipped"
                        );
                        skipped += 1;
                        continue;
                    }

                    if channels.len() >= self.limits.max_channels {
                        warn!(
                            max = self.limits.max_channels,
                            "Channel limit reached, remaining entries ignored"
                        );
                        truncated = true;
                        break;
                    }

                    let channel = self.build_channel(info, line, channels.len() + 1);
                    debug!(index = channels.len() + 1, name = channel.name(), "Channel parsed");
                    channels.push(channel);
                }
            }
        }

        if channels.is_empty() {
            warn!(skipped, "No valid channel found in playlist");
            return Err(ParseError::NoValidChannels);
        }

        info!(
            channels = channels.len(),
            skipped, truncated, "Playlist parsed"
        );

        Ok(ParsedPlaylist {
            channels,
            skipped,
            truncated,
        })
    }

    fn build_channel(&self, info: &str, url: &str, ordinal: usize) -> Channel {
        let name = truncate_chars(extract_channel_name(info), self.limits.max_name_length);
        let name = if name.is_empty() {
            format!("Canal {}", ordinal)
        } else {
            name.to_string()
        };

        let logo = extract_attribute(info, "tvg-logo");
        let logo = if logo.len() > self.limits.max_logo_length {
            debug!(length = logo.len(), "Logo URL too long, dropped");
            ""
        } else {
            logo
        };

        let group = truncate_chars(
            extract_attribute(info, "group-title"),
            self.limits.max_group_length,
        );

        Channel::new(name, url, logo, group)
    }
}

/// Vérifie la présence de l'en-tête `#EXTM3U`, après les blancs et un
/// éventuel BOM UTF-8
fn has_header(text: &str) -> bool {
    text.trim_start()
        .trim_start_matches(BYTE_ORDER_MARK)
        .trim_start()
        .starts_with(HEADER_MARKER)
}

/// Découpe en lignes nettoyées (espaces et tabulations), lignes vides exclues
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(&['\n', '\r'][..])
        .map(trim_blanks)
        .filter(|line| !line.is_empty())
}

fn trim_blanks(line: &str) -> &str {
    line.trim_matches(&[' ', '\t'][..])
}

fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Extrait la valeur d'un attribut `key="valeur"` ou `key='valeur'`
///
/// La forme entre guillemets doubles est recherchée en premier. Retourne une
/// chaîne vide si la clé ou le guillemet fermant est absent ; les guillemets
/// échappés ne sont pas gérés.
pub fn extract_attribute<'a>(line: &'a str, key: &str) -> &'a str {
    for quote in ['"', '\''] {
        let pattern = format!("{}={}", key, quote);
        if let Some(pos) = line.find(&pattern) {
            let value = &line[pos + pattern.len()..];
            return match value.find(quote) {
                Some(end) => &value[..end],
                None => "",
            };
        }
    }
    ""
}

/// Nom de la chaîne : texte après la dernière virgule, nettoyé
pub fn extract_channel_name(line: &str) -> &str {
    match line.rfind(',') {
        Some(pos) => trim_blanks(&line[pos + 1..]),
        None => "",
    }
}

/// Une URL de flux valide commence par `http://` ou `https://`
pub fn is_valid_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
