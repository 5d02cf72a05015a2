//! Projection JSON du catalogue
//!
//! Format produit :
//!
//! ```json
//! {"channels":[{"name":"...","url":"...","logo":"...","group":"..."}],"total":1}
//! ```
//!
//! Avec un budget en octets, le tableau `channels` est tronqué aux
//! enregistrements entiers qui tiennent dans le budget, alors que `total`
//! reflète toujours le nombre réel de chaînes en mémoire. Les consommateurs
//! doivent comparer `total` à la longueur du tableau pour détecter la
//! troncature.

use crate::channel::Channel;
use serde::Serialize;

/// Taille maximale par défaut du document JSON (octets)
pub const DEFAULT_MAX_JSON_SIZE: usize = 64 * 1024;

#[derive(Serialize)]
struct CatalogDocument<'a> {
    channels: &'a [Channel],
    total: usize,
}

/// Sérialiseur du catalogue avec budget optionnel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogJson {
    max_bytes: Option<usize>,
}

impl Default for CatalogJson {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_JSON_SIZE)
    }
}

impl CatalogJson {
    /// Sérialiseur borné à `max_bytes` octets
    pub fn with_limit(max_bytes: usize) -> Self {
        Self {
            max_bytes: Some(max_bytes),
        }
    }

    /// Sérialiseur sans limite de taille
    pub fn unbounded() -> Self {
        Self { max_bytes: None }
    }

    pub fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    /// Nombre d'enregistrements entiers émis pour `channels`
    pub fn emitted_count(&self, channels: &[Channel]) -> usize {
        let Some(max_bytes) = self.max_bytes else {
            return channels.len();
        };

        // Enveloppe vide : {"channels":[],"total":N}
        let mut size = envelope_size(channels.len());
        let mut emitted = 0;

        for channel in channels {
            let record = serde_json::to_string(channel).map(|s| s.len()).unwrap_or(0);
            let separator = usize::from(emitted > 0);
            if size + separator + record > max_bytes {
                break;
            }
            size += separator + record;
            emitted += 1;
        }

        emitted
    }

    /// Sérialise `channels` ; `total` vaut toujours `channels.len()`
    pub fn render(&self, channels: &[Channel]) -> String {
        let emitted = self.emitted_count(channels);
        if emitted < channels.len() {
            tracing::warn!(
                emitted,
                total = channels.len(),
                max_bytes = self.max_bytes,
                "Channel JSON truncated to fit size budget"
            );
        }

        let document = CatalogDocument {
            channels: &channels[..emitted],
            total: channels.len(),
        };

        // La sérialisation de chaînes de caractères ne peut pas échouer
        serde_json::to_string(&document).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize channel list: {}", e);
            format!(r#"{{"channels":[],"total":{}}}"#, channels.len())
        })
    }
}

fn envelope_size(total: usize) -> usize {
    r#"{"channels":[],"total":}"#.len() + total.to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn channels(n: usize) -> Vec<Channel> {
        (0..n)
            .map(|i| Channel::new(format!("Channel {}", i), format!("http://s/{}", i), "", ""))
            .collect()
    }

    #[test]
    fn test_envelope_size_matches_serde() {
        let empty: Vec<Channel> = Vec::new();
        let json = CatalogJson::unbounded().render(&empty);
        assert_eq!(json, r#"{"channels":[],"total":0}"#);
        assert_eq!(json.len(), envelope_size(0));
    }

    #[test]
    fn test_unbounded_emits_everything() {
        let list = channels(20);
        let json: Value = serde_json::from_str(&CatalogJson::unbounded().render(&list)).unwrap();
        assert_eq!(json["channels"].as_array().unwrap().len(), 20);
        assert_eq!(json["total"], 20);
    }

    #[test]
    fn test_budget_is_respected() {
        let list = channels(50);
        let full = CatalogJson::unbounded().render(&list);
        let limit = full.len() / 2;

        let json = CatalogJson::with_limit(limit).render(&list);
        assert!(json.len() <= limit);

        let value: Value = serde_json::from_str(&json).unwrap();
        let emitted = value["channels"].as_array().unwrap().len();
        assert!(emitted > 0 && emitted < 50);
        assert_eq!(value["total"], 50);
    }

    #[test]
    fn test_exact_budget_keeps_all_records() {
        let list = channels(3);
        let full = CatalogJson::unbounded().render(&list);
        assert_eq!(CatalogJson::with_limit(full.len()).emitted_count(&list), 3);
        assert_eq!(CatalogJson::with_limit(full.len() - 1).emitted_count(&list), 2);
    }

    #[test]
    fn test_tiny_budget_emits_no_record() {
        let list = channels(3);
        let value: Value =
            serde_json::from_str(&CatalogJson::with_limit(10).render(&list)).unwrap();
        assert!(value["channels"].as_array().unwrap().is_empty());
        assert_eq!(value["total"], 3);
    }
}
