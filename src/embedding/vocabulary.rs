//! Vocabulary Extractor
//!
//! Keyword lookup against a fixed vocabulary, matched on word boundaries.

use hashbrown::HashSet;
use std::fs;
use std::path::Path;

use super::TermExtractor;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct VocabTerm {
    original: String,
    lower: String,
}

/// Returns the vocabulary entries that occur in a text, in vocabulary order.
#[derive(Debug, Clone, Default)]
pub struct VocabularyExtractor {
    terms: Vec<VocabTerm>,
}

impl VocabularyExtractor {
    /// Build from terms; blanks are skipped and case-insensitive duplicates
    /// keep their first spelling.
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let terms = vocabulary
            .into_iter()
            .filter_map(|term| {
                let original = term.as_ref().trim();
                let lower = original.to_lowercase();
                if lower.is_empty() || !seen.insert(lower.clone()) {
                    return None;
                }
                Some(VocabTerm {
                    original: original.to_owned(),
                    lower,
                })
            })
            .collect();
        Self { terms }
    }

    /// Load one term per line; blank lines and `#` comments are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        ))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.original.as_str())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True if `needle` occurs in `haystack` with no word character directly
/// before or after it.
fn occurs_as_word(haystack: &str, needle: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let begin = start + pos;
        let end = begin + needle.len();

        let before = haystack[..begin].chars().next_back();
        let after = haystack[end..].chars().next();
        if !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char) {
            return true;
        }

        // Step one char past this hit so overlapping hits are tried too
        match haystack[begin..].chars().next() {
            Some(c) => start = begin + c.len_utf8(),
            None => break,
        }
    }
    false
}

impl TermExtractor for VocabularyExtractor {
    fn extract_terms(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let lower = text.to_lowercase();
        Ok(self
            .terms
            .iter()
            .filter(|t| occurs_as_word(&lower, &t.lower))
            .map(|t| t.original.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn extractor() -> VocabularyExtractor {
        VocabularyExtractor::new([
            "Python", "Java", "JavaScript", "C++", "SQL", "PostgreSQL", "Go", "REST",
        ])
    }

    #[test]
    fn test_word_boundaries() {
        let terms = extractor()
            .extract_terms("We use JavaScript and PostgreSQL; REST APIs in Python.")
            .unwrap();
        // "Java" and "SQL" only appear inside longer words
        assert_eq!(terms, vec!["Python", "JavaScript", "PostgreSQL", "REST"]);
    }

    #[test]
    fn test_symbols_and_case() {
        let terms = extractor()
            .extract_terms("Strong c++ skills, some sql, GO services")
            .unwrap();
        assert_eq!(terms, vec!["C++", "SQL", "Go"]);
    }

    #[test]
    fn test_blank_text_rejected() {
        assert!(matches!(
            extractor().extract_terms("  \t "),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_dedup_keeps_first_spelling() {
        let vocab = VocabularyExtractor::new(["Docker", "docker", "", "AWS"]);
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.terms().collect::<Vec<_>>(), vec!["Docker", "AWS"]);
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skills.txt");
        std::fs::write(&path, "# languages\nRust\n\n  Go  \n# tools\nGit\n").unwrap();

        let vocab = VocabularyExtractor::from_file(&path).unwrap();
        assert_eq!(vocab.terms().collect::<Vec<_>>(), vec!["Rust", "Go", "Git"]);
    }

    #[test]
    fn test_overlapping_candidates() {
        let vocab = VocabularyExtractor::new(["go"]);
        // first hit is inside "gogo", second is a standalone word
        assert_eq!(vocab.extract_terms("gogo go").unwrap(), vec!["go"]);
    }
}
