//! Atomic claim extraction and lexical overlap.
//!
//! The scorer works claim-by-claim: an answer is decomposed into short
//! factual statements, and each statement is checked for lexical support
//! against the context chunks.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Words carrying no factual content, excluded from overlap matching.
const STOPWORDS: &[&str] = &[
    "the", "and", "but", "for", "are", "was", "were", "has", "have", "had", "this", "that",
    "these", "those", "with", "from", "its", "can", "could", "will", "would", "should",
    "does", "did", "not", "you", "your", "there", "here", "which", "what", "when", "how", "why",
    "also", "than", "then", "into", "onto", "about", "because",
];

/// Verification result for a single extracted claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimCheck {
    /// The claim text as extracted from the answer.
    pub claim: String,
    /// Whether some single context chunk (or the question, for
    /// context-free turns) lexically supports the claim.
    pub supported: bool,
    /// Indices of context chunks that support the claim.
    pub supporting_chunks: Vec<usize>,
    /// Best single-chunk overlap fraction in [0, 1].
    pub overlap: f64,
}

/// Splits an answer into atomic claims.
///
/// Claims are sentence fragments: the text is cut at sentence terminators
/// and at coordinating boundaries (" and ", "; ", ", but "), so that a
/// sentence stapling a supported fact to an unsupported one is judged as
/// two claims. Fragments without any content token are dropped.
pub(crate) fn extract_claims(answer: &str) -> Vec<String> {
    let mut claims = Vec::new();
    for sentence in answer.split(['.', '?', '!', '\n']) {
        for fragment in split_conjunctions(sentence) {
            let fragment = fragment.trim().trim_matches(',').trim();
            if !fragment.is_empty() && !content_tokens(fragment).is_empty() {
                claims.push(fragment.to_string());
            }
        }
    }
    claims
}

fn split_conjunctions(sentence: &str) -> Vec<&str> {
    let mut fragments = vec![sentence];
    for separator in [" and ", "; ", ", but ", " but "] {
        fragments = fragments
            .into_iter()
            .flat_map(|f| f.split(separator))
            .collect();
    }
    fragments
}

/// Lowercased content tokens of a text.
///
/// Tokens are maximal alphanumeric runs; short non-numeric tokens and
/// stopwords are dropped, and a trailing plural/verb `s` is stripped so
/// "returns" matches "return".
pub(crate) fn content_tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|token| !token.is_empty())
        .filter(|token| token.len() >= 3 || token.chars().all(|c| c.is_ascii_digit()))
        .filter(|token| !STOPWORDS.contains(token))
        .map(stem)
        .collect()
}

fn stem(token: &str) -> String {
    if token.len() > 3 && token.ends_with('s') && !token.ends_with("ss") {
        token[..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

/// Fraction of `claim_tokens` present in `chunk_tokens`.
///
/// Returns 0.0 for an empty claim token set; callers filter those out
/// beforehand.
pub(crate) fn overlap_fraction(
    claim_tokens: &HashSet<String>,
    chunk_tokens: &HashSet<String>,
) -> f64 {
    if claim_tokens.is_empty() {
        return 0.0;
    }
    let hits = claim_tokens
        .iter()
        .filter(|token| chunk_tokens.contains(*token))
        .count();
    hits as f64 / claim_tokens.len() as f64
}
