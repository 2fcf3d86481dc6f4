//! Remote analysis error types

use thiserror::Error;

/// Remote analysis failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::NetworkOrStatus, message)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::new(
            AnalysisErrorKind::NetworkOrStatus,
            format!("HTTP {status}: {body}"),
        )
        .with_status(status)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::MalformedResponse, message)
    }
}

/// Failure classes; the conversation treats both the same way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisErrorKind {
    /// Transport error or non-2xx status
    NetworkOrStatus,
    /// 2xx with a missing, invalid or blank `response` field
    MalformedResponse,
}

impl AnalysisErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkOrStatus => "network_or_status",
            Self::MalformedResponse => "malformed_response",
        }
    }
}
