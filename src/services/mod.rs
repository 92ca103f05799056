// Callable operations
//
// `analyzeEntry` and `chatbotProxy`. Each call runs one sequential
// pipeline: authenticate, validate, (screen), call the model, parse,
// write once, return a summary. Nothing is written unless every earlier
// step succeeded.

mod analysis;
mod chat;

pub use analysis::AnalysisService;
pub use chat::{ChatService, ChatSession, CHAT_MODE, MAX_WRITE_ATTEMPTS};

use serde::{Deserialize, Serialize};

use crate::errors::{ServiceError, ServiceResult};
use crate::store::is_valid_segment;
use crate::types::AnalysisResult;

/// Payload of `analyzeEntry`
///
/// Fields are optional so that a missing field is reported as
/// `InvalidArgument` instead of a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeEntryRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub journal_id: Option<String>,
}

impl AnalyzeEntryRequest {
    pub fn new(text: impl Into<String>, journal_id: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            journal_id: Some(journal_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeEntryResponse {
    pub success: bool,
    pub analysis: AnalysisResult,
    pub has_crisis_trigger: bool,
}

/// Payload of `chatbotProxy`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotProxyRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
}

impl ChatbotProxyRequest {
    pub fn new(message: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            chat_id: Some(chat_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotProxyResponse {
    pub success: bool,
    pub response: String,
    /// Server timestamp of the stored bot message
    pub message_id: String,
}

/// Validate a required text field and a required document id together
///
/// Missing or empty text, or an id that cannot be a path segment, fail with
/// the same message. Whitespace-only text is accepted.
fn require_text_and_id(
    text: Option<String>,
    id: Option<String>,
    message: &str,
) -> ServiceResult<(String, String)> {
    match (text, id) {
        (Some(text), Some(id)) if !text.is_empty() && is_valid_segment(&id) => Ok((text, id)),
        _ => Err(ServiceError::invalid_argument(message)),
    }
}
