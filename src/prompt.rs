// Prompt construction for the two model tasks
//
// Pure string templates: emotion analysis of a journal entry, and a
// supportive chat reply with a short trailing window of prior messages.

use crate::types::{ChatMessage, Emotion};

/// Number of prior chat messages included as context
pub const CHAT_CONTEXT_WINDOW: usize = 5;

/// Persona name the chat model answers as
pub const PERSONA_NAME: &str = "MindMitra";

/// Builds model-input prompts
pub struct PromptBuilder;

impl PromptBuilder {
    /// Prompt asking for a single JSON object `{"emotion", "confidence"}`
    ///
    /// The journal text is embedded verbatim between quotes.
    pub fn build_analysis_prompt(text: &str) -> String {
        let labels = Emotion::all()
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut prompt = String::from(
            "Analyze the emotional content of this journal entry and respond with ONLY a JSON object in this exact format:\n",
        );
        prompt.push_str("{\n");
        prompt.push_str(&format!("  \"emotion\": \"one of: {}\",\n", labels));
        prompt.push_str("  \"confidence\": 0.85\n");
        prompt.push_str("}\n\n");
        prompt.push_str(&format!("Journal entry: \"{}\"\n\n", text));
        prompt.push_str("Respond with only the JSON object, no other text.");
        prompt
    }

    /// Prompt for the next companion reply
    ///
    /// Only the last [`CHAT_CONTEXT_WINDOW`] history entries are rendered,
    /// oldest first, one `role: text` line each.
    pub fn build_chat_prompt(message: &str, history: &[ChatMessage]) -> String {
        let context = Self::context_window(history)
            .iter()
            .map(|msg| format!("{}: {}", msg.role, msg.text))
            .collect::<Vec<_>>()
            .join("\n");

        let mut prompt = format!(
            "You are {}, a compassionate AI mental health companion. ",
            PERSONA_NAME
        );
        prompt.push_str(
            "Provide supportive, empathetic responses to help users with their mental wellness. ",
        );
        prompt.push_str("Keep responses concise (2-3 sentences), warm, and encouraging. ");
        prompt.push_str("If someone expresses crisis thoughts, gently suggest professional help.\n\n");
        prompt.push_str("Previous conversation:\n");
        prompt.push_str(&context);
        prompt.push_str("\n\n");
        prompt.push_str(&format!("User: {}\n\n", message));
        prompt.push_str(&format!("Respond as {}:", PERSONA_NAME));
        prompt
    }

    /// Trailing slice of `history` used as chat context
    pub fn context_window(history: &[ChatMessage]) -> &[ChatMessage] {
        let start = history.len().saturating_sub(CHAT_CONTEXT_WINDOW);
        &history[start..]
    }
}
