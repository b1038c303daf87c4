//! Term Overlap
//!
//! Lexical half of the hybrid score: which target terms the source covers.

use hashbrown::HashSet;

/// How a target term is compared against source terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermMatchMode {
    /// Case-insensitive substring in either direction. Permissive on purpose
    /// so "Go" matches "golang"; also lets short terms like "R" match widely.
    #[default]
    Substring,
    /// One term's token sequence must appear contiguously in the other's
    WholeToken,
}

/// Result of comparing target terms against source terms
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TermOverlap {
    /// Target terms found, in target order, original casing
    pub matched: Vec<String>,
    /// Target terms not found, in target order, original casing
    pub missing: Vec<String>,
    /// `matched / target`; 0.0 for an empty target list
    pub overlap_ratio: f64,
}

/// Split a term into lowercase tokens. `+` and `#` stay inside tokens so
/// "C++" and "C#" survive.
pub(crate) fn tokenize(term: &str) -> Vec<String> {
    term.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}

struct SourceTerm {
    lower: String,
    tokens: Vec<String>,
}

/// Compare `target_terms` against `source_terms`.
///
/// Every target entry is classified, duplicates included. Blank source terms
/// are ignored since they would be a substring of everything.
pub fn term_overlap<T, I, S>(target_terms: &[T], source_terms: I, mode: TermMatchMode) -> TermOverlap
where
    T: AsRef<str>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let sources: Vec<SourceTerm> = source_terms
        .into_iter()
        .filter_map(|s| {
            let lower = s.as_ref().trim().to_lowercase();
            if lower.is_empty() || !seen.insert(lower.clone()) {
                return None;
            }
            let tokens = match mode {
                TermMatchMode::Substring => Vec::new(),
                TermMatchMode::WholeToken => tokenize(&lower),
            };
            Some(SourceTerm { lower, tokens })
        })
        .collect();

    let mut overlap = TermOverlap::default();

    for term in target_terms {
        let term = term.as_ref();
        let found = match mode {
            TermMatchMode::Substring => {
                let lower = term.to_lowercase();
                sources
                    .iter()
                    .any(|s| s.lower.contains(&lower) || lower.contains(&s.lower))
            }
            TermMatchMode::WholeToken => {
                let wanted = tokenize(term);
                sources
                    .iter()
                    .any(|s| contains_run(&s.tokens, &wanted) || contains_run(&wanted, &s.tokens))
            }
        };

        if found {
            overlap.matched.push(term.to_owned());
        } else {
            overlap.missing.push(term.to_owned());
        }
    }

    if !target_terms.is_empty() {
        overlap.overlap_ratio = overlap.matched.len() as f64 / target_terms.len() as f64;
    }

    overlap
}
