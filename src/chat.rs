//! Free-form charter conversation driven by an external chat model
//!
//! The model itself is a collaborator behind [`ChatModel`]; this module only owns
//! the running conversation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{Result, SipocError};

pub const CHARTER_SYSTEM_PROMPT: &str = "You are a Six Sigma Project Chartering Assistant. \
Ask the user for the different details required to be input in a Six Sigma project charter, \
including Project Name, Project Manager, Project Sponsor, Project Team Members, Start Date, \
Expected Completion Date, Estimated Cost, Estimated Savings, Project Overview - Problem/Issue, \
Purpose of Project, Business Case, Goals/Metrics, Project Scope - Within Scope, Without Scope, \
Add today's date. Ask all these questions one by one from the user briefly. Clarify if the \
input from user is not clear. Once all the questions have been asked, summarize all the inputs \
given by the user with the respective titles and as bullet points. The user may type it in \
casual language; rephrase it to sound professional.";

pub const CHARTER_GREETING: &str = "Type '6' to start preparing the Six Sigma Charter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

impl From<ModelError> for SipocError {
    fn from(err: ModelError) -> Self {
        SipocError::Model {
            message: err.to_string(),
        }
    }
}

/// Opaque `(messages) -> message` completion; retries are the caller's business
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> std::result::Result<String, ModelError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharterChat {
    messages: Vec<ChatMessage>,
}

impl Default for CharterChat {
    fn default() -> Self {
        Self::new(CHARTER_SYSTEM_PROMPT, CHARTER_GREETING)
    }
}

impl CharterChat {
    pub fn new(system_prompt: &str, greeting: &str) -> Self {
        Self {
            messages: vec![
                ChatMessage::new(Role::System, system_prompt),
                ChatMessage::new(Role::Assistant, greeting),
            ],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages a front end shows; the system prompt is hidden
    pub fn transcript(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }

    /// Send one user turn. Blank input is ignored.
    ///
    /// On model failure the user turn is rolled back so the same input can be resent.
    pub async fn send(&mut self, model: &dyn ChatModel, input: &str) -> Result<Option<&ChatMessage>> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        self.messages.push(ChatMessage::new(Role::User, input));
        debug!(turns = self.messages.len(), "sending conversation to chat model");

        match model.complete(&self.messages).await {
            Ok(reply) => {
                self.messages.push(ChatMessage::new(Role::Assistant, reply));
                Ok(self.messages.last())
            }
            Err(err) => {
                warn!(error = %err, "chat model call failed");
                self.messages.pop();
                Err(err.into())
            }
        }
    }
}
