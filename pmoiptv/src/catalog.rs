//! Catalog : collection interrogeable des chaînes chargées
//!
//! Le catalogue n'est jamais modifié en place : chaque chargement construit
//! un [`CatalogSnapshot`] complet qui remplace le précédent par un échange de
//! pointeur sous verrou. Un lecteur voit donc soit l'ancien catalogue, soit
//! le nouveau, jamais un mélange des deux.
//!
//! # Exemple
//!
//! ```
//! use pmoiptv::{Catalog, PlaylistParser};
//!
//! let catalog = Catalog::default();
//! let parser = PlaylistParser::default();
//!
//! catalog.load(&parser, "#EXTM3U\n#EXTINF:-1,BBC One\nhttp://s/bbc\n")?;
//! assert_eq!(catalog.count(), 1);
//! assert_eq!(catalog.search("bbc"), vec![0]);
//! # Ok::<(), pmoiptv::ParseError>(())
//! ```

use crate::channel::Channel;
use crate::error::ParseError;
use crate::json::CatalogJson;
use crate::parser::PlaylistParser;
use crate::source::read_playlist_file;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Vue immuable d'une génération du catalogue
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    channels: Vec<Channel>,
    valid: bool,
    last_error: Option<String>,
}

impl CatalogSnapshot {
    fn new(channels: Vec<Channel>, last_error: Option<String>) -> Self {
        Self {
            valid: !channels.is_empty(),
            channels,
            last_error,
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn count(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Chaîne à la position `index` (base 0), `None` hors limites
    pub fn at(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// Indices des chaînes dont le nom contient `query`, sans tenir compte
    /// de la casse, dans l'ordre du document
    ///
    /// Une requête vide retourne tous les indices.
    pub fn search(&self, query: &str) -> Vec<usize> {
        let needle = query.to_lowercase();
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, channel)| channel.name_contains_lowercase(&needle))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// Résumé d'état pour les réponses de diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStatus {
    pub valid: bool,
    pub channel_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Catalogue de chaînes partagé entre un chargeur et de multiples lecteurs
///
/// Le catalogue est possédé explicitement par l'application (typiquement
/// via un `Arc<Catalog>` passé à la couche HTTP) ; il n'existe pas
/// d'instance globale.
#[derive(Debug, Default)]
pub struct Catalog {
    current: RwLock<Arc<CatalogSnapshot>>,
    json: CatalogJson,
}

impl Catalog {
    /// Crée un catalogue vide dont la projection JSON utilise `json`
    pub fn new(json: CatalogJson) -> Self {
        Self {
            current: RwLock::new(Arc::new(CatalogSnapshot::default())),
            json,
        }
    }

    /// Génération courante du catalogue
    ///
    /// À utiliser pour enchaîner plusieurs lectures cohérentes entre elles
    /// (ex: `search` puis `at`).
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn swap(&self, snapshot: CatalogSnapshot) {
        let snapshot = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    /// Conserve les chaînes courantes et enregistre `message` comme dernière erreur
    fn record_error(&self, message: String) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let snapshot = CatalogSnapshot {
            channels: current.channels.clone(),
            valid: current.valid,
            last_error: Some(message),
        };
        *current = Arc::new(snapshot);
    }

    /// Remet le catalogue à l'état vide et invalide
    pub fn clear(&self) {
        self.swap(CatalogSnapshot::default());
        tracing::info!("Channel catalog cleared");
    }

    /// Remplace l'intégralité du catalogue
    ///
    /// Le catalogue est valide si et seulement si `channels` n'est pas vide.
    pub fn replace_with(&self, channels: Vec<Channel>, error: Option<String>) {
        let snapshot = CatalogSnapshot::new(channels, error);
        tracing::debug!(
            channels = snapshot.count(),
            valid = snapshot.is_valid(),
            "Channel catalog replaced"
        );
        self.swap(snapshot);
    }

    /// Analyse `text` puis remplace le catalogue en cas de succès
    ///
    /// En cas d'échec, les chaînes courantes et leur validité sont
    /// conservées : une playlist invalide ne détruit pas une playlist
    /// fonctionnelle. Seul le message de [`Catalog::last_error`] est mis à
    /// jour ; il est effacé au prochain chargement réussi.
    ///
    /// Retourne le nombre de chaînes chargées.
    pub fn load(&self, parser: &PlaylistParser, text: &str) -> Result<usize, ParseError> {
        match parser.parse(text) {
            Ok(parsed) => {
                let count = parsed.len();
                self.replace_with(parsed.into_channels(), None);
                tracing::info!(channels = count, "Channel catalog loaded");
                Ok(count)
            }
            Err(e) => {
                tracing::warn!("Playlist rejected, catalog kept unchanged: {}", e);
                self.record_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Lit le fichier `path` (au plus `max_size` octets) puis appelle [`Catalog::load`]
    ///
    /// Une erreur de lecture est enregistrée comme dernière erreur, comme
    /// une erreur d'analyse.
    pub fn load_file(
        &self,
        parser: &PlaylistParser,
        path: &Path,
        max_size: u64,
    ) -> crate::Result<usize> {
        tracing::debug!(path = %path.display(), "Loading playlist file");
        let text = match read_playlist_file(path, max_size) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Playlist file unreadable: {}", e);
                self.record_error(e.to_string());
                return Err(e.into());
            }
        };
        Ok(self.load(parser, &text)?)
    }

    pub fn count(&self) -> usize {
        self.snapshot().count()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Copie de la chaîne à la position `index`, `None` hors limites
    pub fn at(&self, index: usize) -> Option<Channel> {
        self.snapshot().at(index).cloned()
    }

    /// Voir [`CatalogSnapshot::search`]
    pub fn search(&self, query: &str) -> Vec<usize> {
        self.snapshot().search(query)
    }

    /// Document JSON `{"channels":[...],"total":N}`
    ///
    /// Le tableau peut être tronqué par le budget du sérialiseur ; `total`
    /// reste le nombre réel de chaînes.
    pub fn to_json(&self) -> String {
        self.json.render(self.snapshot().channels())
    }

    pub fn is_valid(&self) -> bool {
        self.snapshot().is_valid()
    }

    pub fn last_error(&self) -> Option<String> {
        self.snapshot().last_error().map(str::to_string)
    }

    pub fn status(&self) -> CatalogStatus {
        let snapshot = self.snapshot();
        CatalogStatus {
            valid: snapshot.is_valid(),
            channel_count: snapshot.count(),
            error: snapshot.last_error().map(str::to_string),
        }
    }
}
