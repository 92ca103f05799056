// Supportive chat

use std::sync::Arc;

use super::{require_text_and_id, ChatbotProxyRequest, ChatbotProxyResponse};
use crate::auth::CallerIdentity;
use crate::errors::{ServiceError, ServiceResult};
use crate::parser::ResponseParser;
use crate::prompt::PromptBuilder;
use crate::providers::{GenerationConfig, ModelGateway};
use crate::store::{
    format_timestamp, DocumentPath, DocumentStore, FieldValue, Fields, Precondition, StoreError,
    WriteResult,
};
use crate::types::ChatMessage;
use serde_json::Value;

const FAILED: &str = "Failed to get chatbot response";

/// Mode tag written on every session update
pub const CHAT_MODE: &str = "support";

/// Session writes attempted before giving up on concurrent modification
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Stored chat session as read before the write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSession {
    /// Decoded messages, used to build the prompt
    pub messages: Vec<ChatMessage>,
    /// Messages exactly as stored; written back untouched
    pub stored: Vec<Value>,
    /// Store version, `None` if the session does not exist yet
    pub version: Option<u64>,
}

/// Proxies one chat turn through the model and appends it to the session
pub struct ChatService {
    gateway: Arc<dyn ModelGateway>,
    store: Arc<dyn DocumentStore>,
}

impl ChatService {
    pub fn new(gateway: Arc<dyn ModelGateway>, store: Arc<dyn DocumentStore>) -> Self {
        Self { gateway, store }
    }

    /// Generate a reply and append the user/bot pair to
    /// `users/{uid}/chats/{chatId}`
    ///
    /// The session is created on first use. The append is conditional on
    /// the session version that was read; if another call wrote in between,
    /// the session is re-read and the same pair is appended to the fresh
    /// message list, without asking the model again.
    pub async fn chatbot_proxy(
        &self,
        caller: Option<&CallerIdentity>,
        request: ChatbotProxyRequest,
    ) -> ServiceResult<ChatbotProxyResponse> {
        let caller = caller.ok_or(ServiceError::Unauthenticated)?;
        let (message, chat_id) = require_text_and_id(
            request.message,
            request.chat_id,
            "Message and chatId are required",
        )?;

        let path =
            DocumentPath::chat(&caller.uid, &chat_id).map_err(|e| ServiceError::internal(FAILED, e))?;
        let session = self.load_session(&path).await?;

        let user_message = ChatMessage::user(message.as_str());

        let prompt = PromptBuilder::build_chat_prompt(&message, &session.messages);
        let response = self
            .gateway
            .generate(&prompt, &GenerationConfig::CHAT)
            .await
            .map_err(|e| ServiceError::internal(FAILED, e))?;
        let reply =
            ResponseParser::extract_chat_reply(&response).map_err(|e| ServiceError::internal(FAILED, e))?;

        let bot_message = ChatMessage::bot(reply.as_str());

        let write = self
            .append_messages(&path, session, &[user_message, bot_message])
            .await?;

        tracing::info!(
            user_id = %caller.uid,
            chat_id = %chat_id,
            version = write.version,
            "Appended chat turn"
        );

        Ok(ChatbotProxyResponse {
            success: true,
            response: reply,
            message_id: format_timestamp(&write.update_time),
        })
    }

    /// Read the session; a missing document is an empty session
    pub async fn load_session(&self, path: &DocumentPath) -> ServiceResult<ChatSession> {
        let snapshot = self
            .store
            .get(path)
            .await
            .map_err(|e| ServiceError::internal(FAILED, e))?;

        match snapshot {
            Some(snapshot) => {
                let stored = snapshot
                    .field::<Vec<Value>>("messages")
                    .map_err(|e| ServiceError::internal(FAILED, e))?
                    .unwrap_or_default();
                let messages = stored
                    .iter()
                    .map(|message| serde_json::from_value::<ChatMessage>(message.clone()))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| ServiceError::internal(FAILED, e))?;
                Ok(ChatSession {
                    messages,
                    stored,
                    version: Some(snapshot.version),
                })
            }
            None => Ok(ChatSession::default()),
        }
    }

    async fn append_messages(
        &self,
        path: &DocumentPath,
        mut session: ChatSession,
        new_messages: &[ChatMessage],
    ) -> ServiceResult<WriteResult> {
        let mut attempt = 1;

        loop {
            let precondition = match session.version {
                Some(version) => Precondition::Version(version),
                None => Precondition::MustNotExist,
            };
            let fields = session_fields(&session.stored, new_messages);

            match self.store.set_merge(path, fields, precondition).await {
                Ok(write) => return Ok(write),
                Err(StoreError::Conflict(_)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!(
                        path = %path,
                        attempt,
                        "Chat session changed during request, re-reading"
                    );
                    session = self.load_session(path).await?;
                    attempt += 1;
                }
                Err(e) => return Err(ServiceError::internal(FAILED, e)),
            }
        }
    }
}

/// Fields written to the session: full message list, mode, last activity
///
/// Existing messages are written back exactly as they were read; new ones
/// get the write's server timestamp.
fn session_fields(existing: &[Value], new_messages: &[ChatMessage]) -> Fields {
    let mut messages = Vec::with_capacity(existing.len() + new_messages.len());
    for message in existing {
        messages.push(FieldValue::Value(message.clone()));
    }
    for message in new_messages {
        messages.push(FieldValue::Map(Fields::from([
            ("role".to_string(), FieldValue::from(message.role.as_str())),
            ("text".to_string(), FieldValue::from(message.text.as_str())),
            ("timestamp".to_string(), FieldValue::ServerTimestamp),
        ])));
    }

    Fields::from([
        ("messages".to_string(), FieldValue::Array(messages)),
        ("mode".to_string(), FieldValue::from(CHAT_MODE)),
        ("lastActivity".to_string(), FieldValue::ServerTimestamp),
    ])
}
