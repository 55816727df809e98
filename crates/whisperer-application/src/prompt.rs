//! Prompt construction for the guardrail loop.
//!
//! The mentor persona and the cautious-retry follow-up mirror the
//! assistant's production prompts; the refined prompt additionally pins
//! the model to the context chunks that survived the failed attempt.

use whisperer_core::turn::Turn;

/// System instruction establishing the mentor persona and the
/// honesty-over-fluency ground rules.
pub fn system_prompt() -> &'static str {
    "You are Code Whisperer, an expert AI code assistant with deep experience in \
software engineering, performance optimization, and best practices.

Your top priority is to provide helpful and accurate responses, even if that \
means saying 'I don't know' or asking the user for clarification.

Rules:
1. If you are unsure or lack enough context, say so. Do NOT guess or make up an answer.
2. Prioritize clarity, truthfulness, and transparency over sounding smart.
3. If a question is vague or open-ended, ask a follow-up before answering.
4. Use clear reasoning to support your answers and cite assumptions when needed.

Always act as a respectful, supportive mentor."
}

/// Prompt for the first attempt of a turn.
///
/// Context chunks travel separately through the model capability; the
/// prompt itself carries the question and the grounding instruction.
pub fn initial_prompt(turn: &Turn) -> String {
    if turn.context.is_empty() {
        format!(
            "{}\n\nAnswer only from what the question itself establishes. \
If that is not enough, say so.",
            turn.question
        )
    } else {
        format!(
            "{}\n\nBase your answer strictly on the supplied context.",
            turn.question
        )
    }
}

/// Refined prompt for a retry after a weak attempt.
///
/// Restates the question, names the surviving context, and instructs the
/// model to drop claims the context cannot back.
pub fn refined_prompt(turn: &Turn, supportive_chunks: &[String]) -> String {
    let mut prompt = format!(
        "Let's try again. The question was: {}\n\n\
Your previous answer contained claims not supported by the available context. \
Answer again using ONLY the context supplied with this message, avoid any claim \
it does not support, and be more specific or cautious.",
        turn.question
    );
    if supportive_chunks.is_empty() {
        prompt.push_str(
            "\n\nNo context chunk supported your previous answer. \
If the question cannot be answered without more material, say so plainly.",
        );
    }
    prompt
}

/// Message emitted when the turn ends in CLARIFICATION_REQUESTED.
pub fn clarification_request(turn: &Turn) -> String {
    format!(
        "I don't have enough context to answer \"{}\" reliably. \
Please share the relevant code, files, or details you are asking about, \
and I'll take another look.",
        turn.question.trim()
    )
}
