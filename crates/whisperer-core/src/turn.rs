//! Turn and attempt domain model.
//!
//! A [`Turn`] is one user question plus the context it should be answered
//! from; an [`Attempt`] is one generate+score cycle inside the retry loop
//! that resolves a turn.

use crate::error::{Result, WhispererError};
use crate::settings::GenerationSettings;
use serde::{Deserialize, Serialize};

/// Categorical grounding outcome for a scored answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Every extracted claim is supported by the context.
    Grounded,
    /// Some claims are supported, some are not.
    Partial,
    /// The answer is essentially unsupported by the context.
    Ungrounded,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Grounded => write!(f, "grounded"),
            Verdict::Partial => write!(f, "partially-grounded"),
            Verdict::Ungrounded => write!(f, "ungrounded"),
        }
    }
}

/// Terminal state of a turn's retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOutcome {
    /// The answer was accepted (grounded, or partial at the retry cap).
    Accepted,
    /// No context was available to ground against; the user is asked to
    /// supply more detail or files instead of receiving a disclaimed answer.
    ClarificationRequested,
    /// Retries exhausted with context present; the best-scoring attempt is
    /// emitted, visibly flagged as low-confidence.
    GaveUp,
}

impl std::fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnOutcome::Accepted => write!(f, "accepted"),
            TurnOutcome::ClarificationRequested => write!(f, "clarification-requested"),
            TurnOutcome::GaveUp => write!(f, "gave-up"),
        }
    }
}

/// One user question plus its context and generation settings.
///
/// Context chunks come from chat history and/or uploaded files upstream;
/// their provenance is opaque here. A turn is immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// The user's question.
    pub question: String,
    /// Ordered context chunks the answer should be grounded in. May be empty.
    pub context: Vec<String>,
    /// Sampling settings forwarded to the model capability.
    pub settings: GenerationSettings,
}

impl Turn {
    /// Creates a turn, validating that the question is non-empty.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the question is empty or whitespace-only.
    pub fn new(
        question: impl Into<String>,
        context: Vec<String>,
        settings: GenerationSettings,
    ) -> Result<Self> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(WhispererError::invalid_input(
                "turn question must not be empty",
            ));
        }
        Ok(Self {
            question,
            context,
            settings,
        })
    }

    /// Total non-whitespace characters across all context chunks.
    ///
    /// Used to distinguish a genuinely usable context from an empty or
    /// near-empty one when choosing between clarification and give-up.
    pub fn context_chars(&self) -> usize {
        self.context
            .iter()
            .map(|chunk| chunk.chars().filter(|c| !c.is_whitespace()).count())
            .sum()
    }
}

/// One generate+score round trip within a turn's retry loop.
///
/// Never mutated after scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// The full prompt sent to the model for this attempt.
    pub prompt_used: String,
    /// The model's raw answer text.
    pub raw_answer: String,
    /// Grounding score in [0, 1].
    pub score: f64,
    /// Grounding verdict for the answer.
    pub verdict: Verdict,
    /// Zero-based index within the turn; bounded by the retry cap.
    pub attempt_index: u32,
}
