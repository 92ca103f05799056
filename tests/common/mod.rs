// Shared test doubles

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use mindmitra::providers::{GenerateResponse, GenerationConfig, ModelGateway};
use std::sync::{Arc, Mutex};

enum StubReply {
    Response(GenerateResponse),
    Fail(String),
}

/// Gateway that returns a canned reply and records every prompt it gets
pub struct StubGateway {
    reply: StubReply,
    calls: Mutex<Vec<(String, GenerationConfig)>>,
}

impl StubGateway {
    fn with_reply(reply: StubReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Replies with one candidate holding `text`
    pub fn text(text: &str) -> Arc<Self> {
        Self::with_reply(StubReply::Response(GenerateResponse::from_text(text)))
    }

    /// Replies with a response that has no candidates
    pub fn empty() -> Arc<Self> {
        Self::with_reply(StubReply::Response(GenerateResponse::default()))
    }

    /// Fails every call with `message`
    pub fn failing(message: &str) -> Arc<Self> {
        Self::with_reply(StubReply::Fail(message.to_string()))
    }

    pub fn calls(&self) -> Vec<(String, GenerationConfig)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|(prompt, _)| prompt.clone())
    }
}

#[async_trait]
impl ModelGateway for StubGateway {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<GenerateResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), *config));

        match &self.reply {
            StubReply::Response(response) => Ok(response.clone()),
            StubReply::Fail(message) => anyhow::bail!("{}", message),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}
