//! API request and response types

use crate::i18n::Language;
use crate::runtime::SessionSnapshot;
use crate::state_machine::SocialChoice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request to start a session
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Language code; the configured default when absent
    #[serde(default)]
    pub language: Option<String>,
}

/// Response for a new session
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub choice: SocialChoice,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

/// Response for actions handed to a session
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Full message catalog for one language
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub language: Language,
    pub messages: BTreeMap<&'static str, &'static str>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
