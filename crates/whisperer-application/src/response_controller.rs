//! Response controller: the bounded retry loop around the model capability.
//!
//! One user turn flows Start -> Answered -> Scored and then resolves to
//! Accepted, Retrying (back to Start with a refined prompt), Clarifying,
//! or GaveUp. Infra failures and caller cancellation propagate as errors;
//! weak grounding never does.

use crate::prompt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use whisperer_core::error::{Result, WhispererError};
use whisperer_core::grounding::{GroundingConfig, GroundingReport, GroundingScorer};
use whisperer_core::model_client::ModelClient;
use whisperer_core::session::{Session, TurnRecord};
use whisperer_core::turn::{Attempt, Turn, TurnOutcome, Verdict};

/// Policy knobs for the retry loop.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Maximum number of retries after the first attempt. The attempt
    /// index therefore never exceeds this value.
    pub max_retries: u32,
    /// Wall-clock budget for the whole turn, across all attempts.
    /// Distinct from any per-call timeout inside the model client.
    pub turn_timeout: Duration,
    /// Below this many non-whitespace context characters the context is
    /// treated as near-empty, steering terminal UNGROUNDED turns toward a
    /// clarification request instead of a disclaimed answer.
    pub near_empty_context_chars: usize,
    /// Scorer thresholds.
    pub grounding: GroundingConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            turn_timeout: Duration::from_secs(60),
            near_empty_context_chars: 12,
            grounding: GroundingConfig::default(),
        }
    }
}

/// The value handed back to the chat UI for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalOutput {
    /// The text to display: an answer, or a clarification request.
    pub text: String,
    /// Terminal state the turn resolved to.
    pub outcome: TurnOutcome,
    /// Grounding verdict of the attempt behind `text`.
    pub verdict: Verdict,
    /// Grounding score of that attempt, in [0, 1].
    pub confidence: f64,
    /// Number of generate+score cycles the turn consumed.
    pub attempts_made: u32,
    /// Visible disclaimer for anything other than an accepted grounded
    /// answer. The UI must render this next to the text.
    pub annotation: Option<String>,
}

impl FinalOutput {
    /// Whether the output carries a visible low-confidence marker.
    pub fn is_flagged(&self) -> bool {
        !(self.outcome == TurnOutcome::Accepted && self.verdict == Verdict::Grounded)
    }

    /// Text plus annotation, ready for display.
    pub fn rendered(&self) -> String {
        match &self.annotation {
            Some(annotation) => format!("{}\n\n[{}]", self.text, annotation),
            None => self.text.clone(),
        }
    }
}

/// Transition taken out of the Scored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    Accept,
    Retry,
    Clarify,
    GiveUp,
}

/// Orchestrates one user turn: calls the model, scores the answer, and
/// decides among accept, retry with a refined prompt, ask the user for
/// clarification, or give up with a disclaimer.
///
/// Retries are strictly sequential: each refined prompt depends on the
/// previous attempt's score, so at most one generation call is in flight
/// per turn.
pub struct ResponseController {
    config: ControllerConfig,
    scorer: GroundingScorer,
}

impl ResponseController {
    /// Creates a controller; the scorer inherits the config's thresholds.
    pub fn new(config: ControllerConfig) -> Self {
        let scorer = GroundingScorer::new(config.grounding.clone());
        Self { config, scorer }
    }

    /// Processes one turn to a terminal outcome.
    ///
    /// Appends the completed turn and its chosen attempt to `session`;
    /// that is the only side effect.
    ///
    /// # Errors
    ///
    /// Returns `ModelUnavailable` if the generation call fails (never
    /// retried here) and `InvalidInput` on scorer contract violations.
    pub async fn handle(
        &self,
        session: &mut Session,
        turn: Turn,
        client: &dyn ModelClient,
    ) -> Result<FinalOutput> {
        self.handle_with_cancellation(session, turn, client, &CancellationToken::new())
            .await
    }

    /// Like [`handle`](Self::handle), but abandons the in-flight
    /// generation call when `cancel` fires. A cancelled turn appends no
    /// partial attempt to the session.
    pub async fn handle_with_cancellation(
        &self,
        session: &mut Session,
        turn: Turn,
        client: &dyn ModelClient,
        cancel: &CancellationToken,
    ) -> Result<FinalOutput> {
        let deadline = Instant::now() + self.config.turn_timeout;
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut prompt_text = prompt::initial_prompt(&turn);
        let mut call_context = turn.context.clone();

        loop {
            // Start: the whole retry loop shares one wall-clock budget.
            let attempt_index = attempts.len() as u32;
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Ok(self.finish_timeout(session, &turn, &attempts));
            };

            tracing::debug!(
                "Generating attempt {} ({} context chunks in call)",
                attempt_index,
                call_context.len()
            );
            let generated = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Turn cancelled; abandoning in-flight generation");
                    return Err(WhispererError::Cancelled);
                }
                result = tokio::time::timeout(
                    remaining,
                    client.generate(&prompt_text, &call_context, &turn.settings),
                ) => result,
            };

            // Answered, or a terminal failure of the capability.
            let answer = match generated {
                Err(_) => return Ok(self.finish_timeout(session, &turn, &attempts)),
                Ok(Err(err)) => {
                    tracing::warn!("Model call failed on attempt {}: {}", attempt_index, err);
                    return Err(err);
                }
                Ok(Ok(answer)) => answer,
            };

            // Scored. A blank completion cannot be decomposed into claims
            // and counts as fully ungrounded rather than a contract error.
            let report = if answer.trim().is_empty() {
                GroundingReport {
                    score: 0.0,
                    verdict: Verdict::Ungrounded,
                    claims: Vec::new(),
                }
            } else {
                self.scorer.score(&answer, &turn.context, &turn.question)?
            };

            let attempt = Attempt {
                prompt_used: prompt_text.clone(),
                raw_answer: answer,
                score: report.score,
                verdict: report.verdict,
                attempt_index,
            };
            tracing::debug!(
                "Attempt {} scored {:.2} ({})",
                attempt_index,
                attempt.score,
                attempt.verdict
            );
            attempts.push(attempt);

            match self.decide(report.verdict, attempt_index, &turn) {
                Policy::Accept => return Ok(self.finish_accepted(session, &turn, &attempts)),
                Policy::Clarify => return Ok(self.finish_clarifying(session, &turn, &attempts)),
                Policy::GiveUp => return Ok(self.finish_gave_up(session, &turn, &attempts)),
                Policy::Retry => {
                    let supportive: Vec<String> = report
                        .supportive_chunks()
                        .into_iter()
                        .map(|index| turn.context[index].clone())
                        .collect();
                    tracing::info!(
                        "Retrying after {} verdict; {} of {} chunks survive",
                        report.verdict,
                        supportive.len(),
                        turn.context.len()
                    );
                    prompt_text = prompt::refined_prompt(&turn, &supportive);
                    call_context = supportive;
                }
            }
        }
    }

    /// The transition table out of the Scored state.
    fn decide(&self, verdict: Verdict, attempt_index: u32, turn: &Turn) -> Policy {
        let at_cap = attempt_index >= self.config.max_retries;
        match verdict {
            Verdict::Grounded => Policy::Accept,
            Verdict::Partial if at_cap => Policy::Accept,
            Verdict::Partial => Policy::Retry,
            Verdict::Ungrounded if !at_cap => Policy::Retry,
            Verdict::Ungrounded => {
                if turn.context_chars() < self.config.near_empty_context_chars {
                    Policy::Clarify
                } else {
                    Policy::GiveUp
                }
            }
        }
    }

    fn finish_accepted(
        &self,
        session: &mut Session,
        turn: &Turn,
        attempts: &[Attempt],
    ) -> FinalOutput {
        let best = best_attempt(attempts).clone();
        let annotation = match best.verdict {
            Verdict::Grounded => None,
            _ => Some(format!(
                "Confidence {}%: parts of this answer may not be supported by the provided context.",
                percent(best.score)
            )),
        };
        let output = FinalOutput {
            text: best.raw_answer.clone(),
            outcome: TurnOutcome::Accepted,
            verdict: best.verdict,
            confidence: best.score,
            attempts_made: attempts.len() as u32,
            annotation,
        };
        record(session, turn, best, TurnOutcome::Accepted);
        output
    }

    fn finish_clarifying(
        &self,
        session: &mut Session,
        turn: &Turn,
        attempts: &[Attempt],
    ) -> FinalOutput {
        let best = best_attempt(attempts).clone();
        let output = FinalOutput {
            text: prompt::clarification_request(turn),
            outcome: TurnOutcome::ClarificationRequested,
            verdict: best.verdict,
            confidence: best.score,
            attempts_made: attempts.len() as u32,
            annotation: None,
        };
        record(session, turn, best, TurnOutcome::ClarificationRequested);
        output
    }

    fn finish_gave_up(
        &self,
        session: &mut Session,
        turn: &Turn,
        attempts: &[Attempt],
    ) -> FinalOutput {
        let best = best_attempt(attempts).clone();
        let output = FinalOutput {
            text: best.raw_answer.clone(),
            outcome: TurnOutcome::GaveUp,
            verdict: best.verdict,
            confidence: best.score,
            attempts_made: attempts.len() as u32,
            annotation: Some(format!(
                "Low confidence ({}%): this answer could not be verified against the provided context.",
                percent(best.score)
            )),
        };
        record(session, turn, best, TurnOutcome::GaveUp);
        output
    }

    /// Wall-clock budget exhausted: give up with the best attempt scored
    /// so far. With nothing scored yet there is nothing to record, so the
    /// session stays untouched and the output says only that time ran out.
    fn finish_timeout(
        &self,
        session: &mut Session,
        turn: &Turn,
        attempts: &[Attempt],
    ) -> FinalOutput {
        tracing::warn!(
            "Turn timed out after {} scored attempt(s)",
            attempts.len()
        );
        if attempts.is_empty() {
            return FinalOutput {
                text: "I ran out of time before producing an answer. Please try again."
                    .to_string(),
                outcome: TurnOutcome::GaveUp,
                verdict: Verdict::Ungrounded,
                confidence: 0.0,
                attempts_made: 0,
                annotation: Some("Timed out with no answer to verify.".to_string()),
            };
        }
        self.finish_gave_up(session, turn, attempts)
    }
}

impl Default for ResponseController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

/// Highest-scoring attempt; on equal scores the earliest one wins, so
/// terminal selection is deterministic.
fn best_attempt(attempts: &[Attempt]) -> &Attempt {
    attempts
        .iter()
        .reduce(|best, candidate| {
            if candidate.score > best.score {
                candidate
            } else {
                best
            }
        })
        // Safe to unwrap: every finish path runs after at least one push
        .unwrap()
}

fn record(session: &mut Session, turn: &Turn, attempt: Attempt, outcome: TurnOutcome) {
    session.push_record(TurnRecord {
        turn: turn.clone(),
        attempt,
        outcome,
        completed_at: chrono::Utc::now().to_rfc3339(),
    });
}

fn percent(score: f64) -> u32 {
    (score * 100.0).round() as u32
}
