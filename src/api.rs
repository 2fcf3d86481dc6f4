//! HTTP API for caption chat
//!
//! Hosts live conversation sessions: actions in as JSON or raw image bytes,
//! transcript and step changes out over SSE.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    /// Largest accepted image upload
    pub max_image_bytes: usize,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, max_image_bytes: usize) -> Self {
        Self {
            sessions,
            max_image_bytes,
        }
    }
}
