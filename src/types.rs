// Domain types shared by the analysis and chat pipelines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Emotion label assigned to a journal entry.
///
/// Closed set: anything the model returns outside of it is treated as
/// unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Anxious,
    Angry,
    Neutral,
    Excited,
    Depressed,
    Hopeful,
    Frustrated,
    Calm,
}

impl Emotion {
    pub fn all() -> &'static [Emotion] {
        &[
            Emotion::Happy,
            Emotion::Sad,
            Emotion::Anxious,
            Emotion::Angry,
            Emotion::Neutral,
            Emotion::Excited,
            Emotion::Depressed,
            Emotion::Hopeful,
            Emotion::Frustrated,
            Emotion::Calm,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Anxious => "anxious",
            Emotion::Angry => "angry",
            Emotion::Neutral => "neutral",
            Emotion::Excited => "excited",
            Emotion::Depressed => "depressed",
            Emotion::Hopeful => "hopeful",
            Emotion::Frustrated => "frustrated",
            Emotion::Calm => "calm",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        Emotion::all()
            .iter()
            .copied()
            .find(|e| e.as_str() == label)
            .ok_or_else(|| format!("unknown emotion label: {}", s))
    }
}

/// Emotion label plus the model's confidence in it (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub emotion: Emotion,
    pub confidence: f64,
}

impl AnalysisResult {
    /// Used whenever the model output cannot be interpreted
    pub const FALLBACK: AnalysisResult = AnalysisResult {
        emotion: Emotion::Neutral,
        confidence: 0.5,
    };
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Bot,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Bot => "bot",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored message of a chat session
///
/// `timestamp` is assigned by the document store when the message is
/// written, so it is absent only for messages that were never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            timestamp: None,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Bot,
            text: text.into(),
            timestamp: None,
        }
    }
}
