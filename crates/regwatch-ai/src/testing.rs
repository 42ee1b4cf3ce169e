//! In-memory [`GenerativeClient`] that replays scripted replies and records
//! every request it receives.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::client::{ClientError, GenerateRequest, GenerateResponse, GenerativeClient};

enum Reply {
    Ok(GenerateResponse),
    Err(String),
}

#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    repeat: Option<GenerateResponse>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply with the given text and no grounding.
    pub fn reply_text(self, text: impl Into<String>) -> Self {
        self.reply(GenerateResponse {
            text: text.into(),
            grounding: None,
        })
    }

    pub fn reply(mut self, response: GenerateResponse) -> Self {
        self.replies.get_mut().push_back(Reply::Ok(response));
        self
    }

    /// Queue a provider failure carrying `message`.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.replies.get_mut().push_back(Reply::Err(message.into()));
        self
    }

    /// Reply with `text` whenever the queue is exhausted.
    pub fn always_text(mut self, text: impl Into<String>) -> Self {
        self.repeat = Some(GenerateResponse {
            text: text.into(),
            grounding: None,
        });
        self
    }

    pub async fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl GenerativeClient for ScriptedClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ClientError> {
        self.requests.lock().await.push(request);
        match self.replies.lock().await.pop_front() {
            Some(Reply::Ok(response)) => Ok(response),
            Some(Reply::Err(message)) => Err(ClientError::Other(message)),
            None => self
                .repeat
                .clone()
                .ok_or_else(|| ClientError::Other("no scripted reply left".into())),
        }
    }
}
