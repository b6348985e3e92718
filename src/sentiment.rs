use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

/// Scores are clamped to this magnitude.
pub const MAX_SCORE: i32 = 10;

/// Read a word list: one term per line, trimmed, blank lines dropped.
/// A missing file yields an empty list.
pub fn load_words(path: impl AsRef<Path>) -> Vec<String> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            warn!("Failed to read word list {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Positive and negative terms used to score headlines.
/// Built once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl Lexicon {
    pub fn new(positive: Vec<String>, negative: Vec<String>) -> Self {
        // Titles are lowercased before matching, so terms must be too;
        // otherwise a capitalised line in a word file could never match.
        let lower = |words: Vec<String>| -> Vec<String> {
            words.into_iter().map(|w| w.to_lowercase()).collect()
        };
        Lexicon {
            positive: lower(positive),
            negative: lower(negative),
        }
    }

    pub fn load(positive_path: impl AsRef<Path>, negative_path: impl AsRef<Path>) -> Self {
        let lexicon = Self::new(load_words(positive_path), load_words(negative_path));
        info!(
            "Loaded lexicon: {} positive, {} negative terms",
            lexicon.positive.len(),
            lexicon.negative.len()
        );
        lexicon
    }

    pub fn positive(&self) -> &[String] {
        &self.positive
    }

    pub fn negative(&self) -> &[String] {
        &self.negative
    }

    /// Score a headline: +1 per positive term found as a substring, -1 per
    /// negative term, clamped to [-10, 10]. No tokenization, so "good"
    /// also matches inside "goodbye".
    pub fn score(&self, title: &str) -> i32 {
        let title = title.to_lowercase();
        let hits = |words: &[String]| words.iter().filter(|w| title.contains(w.as_str())).count();

        let raw = hits(&self.positive) as i64 - hits(&self.negative) as i64;
        raw.clamp(-(MAX_SCORE as i64), MAX_SCORE as i64) as i32
    }
}
