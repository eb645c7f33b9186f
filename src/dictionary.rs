//! Dictionary lookup links for a committed word or phrase.

use crate::config::DictionaryConfig;

/// Placeholder replaced by the encoded word in a URL template.
const WORD_PLACEHOLDER: &str = "{word}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryLink {
    pub name: String,
    pub url: String,
}

/// One link per configured dictionary. Blank input yields no links.
pub fn lookup_links(word: &str, dictionaries: &[DictionaryConfig]) -> Vec<DictionaryLink> {
    let word = word.trim();
    if word.is_empty() {
        return Vec::new();
    }

    let encoded = encode_word(word);
    dictionaries
        .iter()
        .map(|dict| DictionaryLink {
            name: dict.name.clone(),
            url: dict.url_template.replace(WORD_PLACEHOLDER, &encoded),
        })
        .collect()
}

/// Percent-encodes everything except unreserved characters and apostrophes.
fn encode_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for byte in word.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'\'' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_lookup_links_default_providers() {
        let config = AppConfig::default();
        let links = lookup_links("Serendipity", &config.dictionaries);

        assert_eq!(links.len(), 3);
        assert_eq!(links[0].name, "Cambridge");
        assert_eq!(
            links[0].url,
            "https://dictionary.cambridge.org/dictionary/english/Serendipity"
        );
        assert_eq!(links[2].url, "https://www.ldoceonline.com/dictionary/Serendipity");
    }

    #[test]
    fn test_lookup_links_encodes_phrases() {
        let config = AppConfig::default();
        let links = lookup_links("Hello, world", &config.dictionaries);
        assert!(links[1].url.ends_with("/Hello%2C%20world"));

        let links = lookup_links("it's café", &config.dictionaries);
        assert!(links[0].url.ends_with("/it's%20caf%C3%A9"));
    }

    #[test]
    fn test_lookup_links_blank() {
        assert!(lookup_links("  ", &AppConfig::default().dictionaries).is_empty());
    }
}
