//! Prompt assembly for chat calls.
//!
//! Builds the system prompt that carries the rolling conversation context,
//! and the user prompt augmented with a knowledge-base answer.

const CONVERSATION_PREAMBLE: &str = "\
The following is a friendly conversation between a human and an AI. \
The AI is talkative and provides lots of specific details from its context. \
If the AI does not know the answer to a question, it truthfully says it does not know.";

/// Build the system prompt for a conversational call.
///
/// If `context` is blank, returns the preamble alone.
pub fn conversation_system_prompt(context: &str) -> String {
    let context = context.trim();
    if context.is_empty() {
        return CONVERSATION_PREAMBLE.to_string();
    }
    format!("{CONVERSATION_PREAMBLE}\n\nCurrent conversation:\n{context}")
}

/// Ground the user's question with an answer from the knowledge base.
///
/// Without an answer (or with a blank one) the question is returned as is.
pub fn augment_prompt(user_text: &str, kb_answer: Option<&str>) -> String {
    match kb_answer.map(str::trim).filter(|a| !a.is_empty()) {
        Some(answer) => format!(
            "Question: {user_text}\n\n\
             Relevant information from knowledge base: {answer}\n\n\
             Please provide a complete answer."
        ),
        None => user_text.to_string(),
    }
}
