//! Prompt builders for the generation intents.
//!
//! Both prompts pin the model to the retrieved context and forbid invented
//! figures; the fee prompt additionally targets the fixed `Fees (Rs.)` line
//! format the chunker preserves from the source tables.

use crate::types::{ChatRole, ChatTurn};

/// Maximum prior turns included in a generation prompt.
const HISTORY_TURNS: usize = 6;

/// Prompt for fee questions: extract the exact rupee figure or decline.
pub fn fee_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a helpful assistant for Sunbeam Institute. Answer the fee question \
using ONLY the context below.

CRITICAL INSTRUCTIONS:
1. Look for fee amounts in the context, including lines like \"Fees (Rs.): 4000\" \
or \"Fees (Rs.): 9500\".
2. State the amount exactly as found, formatted as: The fees for [program/course] \
is \u{20b9}[amount].
3. If the context lists fees for several batches or programs, mention each one \
that matches the question.
4. If no fee information for the asked program appears in the context, say you \
don't have that fee information and suggest contacting Sunbeam directly. Do NOT \
guess or invent an amount.

Context:
{context}

Question: {question}

Answer:"
    )
}

/// General-purpose prompt: grounded answers, exact figures, graceful declines.
///
/// When `history` is non-empty its last [`HISTORY_TURNS`] turns are included
/// so follow-up questions ("what about its fees?") resolve their referent.
pub fn general_prompt(question: &str, context: &str, history: &[ChatTurn]) -> String {
    let mut conversation = String::new();
    if !history.is_empty() {
        conversation.push_str("Recent conversation:\n");
        let start = history.len().saturating_sub(HISTORY_TURNS);
        for turn in &history[start..] {
            let speaker = match turn.role {
                ChatRole::User => "User",
                ChatRole::Assistant => "Assistant",
            };
            conversation.push_str(&format!("{speaker}: {}\n", turn.content));
        }
        conversation.push('\n');
    }

    format!(
        "You are a helpful assistant for Sunbeam Institute, Pune. Answer questions \
about Sunbeam's courses, internships, and services using ONLY the context below.

INSTRUCTIONS:
1. Respond to greetings naturally and briefly.
2. Extract exact figures, dates, durations, and names from the context; never \
invent or round them.
3. If the context does not contain the answer, say so and suggest visiting \
https://www.sunbeaminfo.in or contacting the institute.
4. Keep answers concise and factual.

{conversation}Context:
{context}

Question: {question}

Answer:"
    )
}
