//! Grounding scorer: claim-level lexical support against context.

use super::claim::{ClaimCheck, content_tokens, extract_claims, overlap_fraction};
use crate::error::{Result, WhispererError};
use crate::turn::Verdict;
use serde::{Deserialize, Serialize};

/// Thresholds for the grounding scorer.
///
/// The exact heuristic of the upstream assistant is not nailed down
/// anywhere authoritative, so all three knobs are configuration rather
/// than constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingConfig {
    /// Score at or above which the verdict is GROUNDED.
    pub grounded_threshold: f64,
    /// Score at or above which (and below `grounded_threshold`) the
    /// verdict is PARTIAL; below it, UNGROUNDED.
    pub partial_threshold: f64,
    /// Minimum single-chunk token overlap for a claim to count as
    /// supported.
    pub support_threshold: f64,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            grounded_threshold: 0.75,
            partial_threshold: 0.4,
            support_threshold: 0.5,
        }
    }
}

/// Scoring result: overall score, verdict, and per-claim evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingReport {
    /// Fraction of claims supported, in [0, 1].
    pub score: f64,
    /// Categorical verdict derived from `score`.
    pub verdict: Verdict,
    /// Per-claim verification details, in answer order.
    pub claims: Vec<ClaimCheck>,
}

impl GroundingReport {
    /// Sorted, deduplicated indices of context chunks that supported at
    /// least one claim. The retry prompt is restricted to these.
    pub fn supportive_chunks(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .claims
            .iter()
            .flat_map(|check| check.supporting_chunks.iter().copied())
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// Quantifies how well an answer is supported by the supplied context,
/// independent of fluency.
///
/// Pure: scoring the same (answer, context, question) triple twice yields
/// identical results, and nothing is mutated or emitted.
#[derive(Debug, Clone, Default)]
pub struct GroundingScorer {
    config: GroundingConfig,
}

impl GroundingScorer {
    /// Creates a scorer with the given thresholds.
    pub fn new(config: GroundingConfig) -> Self {
        Self { config }
    }

    /// Scores `answer` against `context`.
    ///
    /// The answer is decomposed into atomic claims; each claim counts as
    /// supported when its content-token overlap with some single context
    /// chunk reaches the support threshold. With an empty context, claims
    /// are only checkable against the question itself, so anything beyond
    /// a restatement of the question is unsupported by construction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `answer` or `question` is empty or
    /// whitespace-only. Never fails on empty context.
    pub fn score(&self, answer: &str, context: &[String], question: &str) -> Result<GroundingReport> {
        if answer.trim().is_empty() {
            return Err(WhispererError::invalid_input(
                "scorer requires a non-empty answer",
            ));
        }
        if question.trim().is_empty() {
            return Err(WhispererError::invalid_input(
                "scorer requires a non-empty question",
            ));
        }

        let chunk_tokens: Vec<_> = context.iter().map(|chunk| content_tokens(chunk)).collect();
        let question_tokens = content_tokens(question);

        let claims = extract_claims(answer);
        let checks: Vec<ClaimCheck> = claims
            .into_iter()
            .map(|claim| {
                let tokens = content_tokens(&claim);
                let mut supporting_chunks = Vec::new();
                let mut best = 0.0f64;
                for (index, chunk) in chunk_tokens.iter().enumerate() {
                    let overlap = overlap_fraction(&tokens, chunk);
                    if overlap >= self.config.support_threshold {
                        supporting_chunks.push(index);
                    }
                    best = best.max(overlap);
                }
                if chunk_tokens.is_empty() {
                    // No context: the question is the only ground truth.
                    best = best.max(overlap_fraction(&tokens, &question_tokens));
                }
                ClaimCheck {
                    claim,
                    supported: best >= self.config.support_threshold,
                    supporting_chunks,
                    overlap: best,
                }
            })
            .collect();

        let score = if checks.is_empty() {
            0.0
        } else {
            let supported = checks.iter().filter(|check| check.supported).count();
            supported as f64 / checks.len() as f64
        };

        Ok(GroundingReport {
            score,
            verdict: self.verdict_for(score),
            claims: checks,
        })
    }

    fn verdict_for(&self, score: f64) -> Verdict {
        if score >= self.config.grounded_threshold {
            Verdict::Grounded
        } else if score >= self.config.partial_threshold {
            Verdict::Partial
        } else {
            Verdict::Ungrounded
        }
    }
}
