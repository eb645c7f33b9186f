use anyhow::Result;
use regex::Regex;

use super::engine::RecognizedSpan;
use crate::capture::geometry::BoundingBox;

/// Leading or trailing run of characters that are not ASCII letters or digits.
const EDGE_PUNCTUATION_PATTERN: &str = r"^[^a-zA-Z0-9]+|[^a-zA-Z0-9]+$";

/// A recognized word the user can tap.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Text with edge punctuation removed; what single/multiple mode commit.
    pub display_text: String,
    /// Text exactly as recognized; what sentence mode joins.
    pub original_text: String,
    pub bbox: BoundingBox,
}

/// Cleans recognizer output into the candidate list.
#[derive(Debug, Clone)]
pub struct CandidateNormalizer {
    edge: Regex,
}

impl CandidateNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            edge: Regex::new(EDGE_PUNCTUATION_PATTERN)?,
        })
    }

    /// Trims whitespace, then strips punctuation from both ends.
    /// Interior apostrophes and hyphens survive.
    pub fn trim_punctuation(&self, text: &str) -> String {
        self.edge.replace_all(text.trim(), "").into_owned()
    }

    /// Keeps spans with more than one character and at least one letter,
    /// in the order the recognizer returned them.
    pub fn normalize(&self, spans: &[RecognizedSpan]) -> Vec<Candidate> {
        let candidates: Vec<Candidate> = spans
            .iter()
            .filter_map(|span| {
                let display_text = self.trim_punctuation(&span.text);
                is_word_like(&display_text).then(|| Candidate {
                    display_text,
                    original_text: span.text.clone(),
                    bbox: span.bbox,
                })
            })
            .collect();

        log::info!(
            "Kept {} of {} recognized spans",
            candidates.len(),
            spans.len()
        );
        candidates
    }
}

/// Rejects single characters, pure numbers and pure punctuation.
fn is_word_like(text: &str) -> bool {
    text.chars().count() > 1 && text.chars().any(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x0: f32) -> RecognizedSpan {
        RecognizedSpan {
            text: text.to_string(),
            bbox: BoundingBox { x0, y0: 0.0, x1: x0 + 10.0, y1: 10.0 },
        }
    }

    #[test]
    fn test_trim_punctuation() {
        let normalizer = CandidateNormalizer::new().unwrap();
        assert_eq!(normalizer.trim_punctuation("!!hello,"), "hello");
        assert_eq!(normalizer.trim_punctuation("  \"well-known\". "), "well-known");
        assert_eq!(normalizer.trim_punctuation("it's"), "it's");
        assert_eq!(normalizer.trim_punctuation("..."), "");
    }

    #[test]
    fn test_normalize_filters_noise() {
        let normalizer = CandidateNormalizer::new().unwrap();
        let spans = vec![
            span("a", 0.0),
            span("123", 10.0),
            span("it's", 20.0),
            span("!!hello,", 30.0),
            span("--", 40.0),
            span("(x)", 50.0),
            span("B2", 60.0),
        ];

        let candidates = normalizer.normalize(&spans);
        let texts: Vec<&str> = candidates.iter().map(|c| c.display_text.as_str()).collect();
        assert_eq!(texts, vec!["it's", "hello", "B2"]);
    }

    #[test]
    fn test_normalize_keeps_original_text_and_order() {
        let normalizer = CandidateNormalizer::new().unwrap();
        let spans = vec![span("world!", 50.0), span("Hello,", 0.0)];

        let candidates = normalizer.normalize(&spans);
        assert_eq!(candidates[0].display_text, "world");
        assert_eq!(candidates[0].original_text, "world!");
        assert_eq!(candidates[0].bbox.x0, 50.0);
        assert_eq!(candidates[1].original_text, "Hello,");
    }
}
