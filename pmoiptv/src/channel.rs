//! Channel : entrée validée d'un catalogue IPTV

use serde::{Deserialize, Serialize};

/// Une chaîne extraite d'une playlist
///
/// Une instance n'est construite par le parser qu'après validation de
/// l'URL de flux ; le nom n'est jamais vide. Les champs optionnels absents
/// valent la chaîne vide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    name: String,
    url: String,
    #[serde(default)]
    logo: String,
    #[serde(default)]
    group: String,
}

impl Channel {
    /// Crée une chaîne
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        logo: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            logo: logo.into(),
            group: group.into(),
        }
    }

    /// Nom affiché
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL du flux, identique octet pour octet à la ligne source
    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL du logo (`tvg-logo`), vide si absente
    pub fn logo(&self) -> &str {
        &self.logo
    }

    /// Groupe (`group-title`), vide si absent
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Vrai si le nom contient `needle`, déjà passé en minuscules
    pub(crate) fn name_contains_lowercase(&self, needle: &str) -> bool {
        needle.is_empty() || self.name.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_field_names() {
        let channel = Channel::new("BBC One", "http://s/bbc", "http://l/bbc.png", "UK");
        let json = serde_json::to_value(&channel).unwrap();

        assert_eq!(json["name"], "BBC One");
        assert_eq!(json["url"], "http://s/bbc");
        assert_eq!(json["logo"], "http://l/bbc.png");
        assert_eq!(json["group"], "UK");
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let channel: Channel =
            serde_json::from_str(r#"{"name":"A","url":"https://a"}"#).unwrap();
        assert_eq!(channel.logo(), "");
        assert_eq!(channel.group(), "");
    }

    #[test]
    fn test_name_match_is_case_insensitive() {
        let channel = Channel::new("BBC One", "http://s", "", "");
        assert!(channel.name_contains_lowercase("bbc"));
        assert!(channel.name_contains_lowercase(""));
        assert!(!channel.name_contains_lowercase("itv"));
    }
}
