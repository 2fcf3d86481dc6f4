//! Mock analysis services for testing
//!
//! These mocks let the runtime be driven without any network I/O.

use crate::analysis::{AnalysisError, AnalysisService};
use crate::i18n::Language;
use crate::transcript::ImageBlob;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::{Notify, Semaphore};

// ============================================================================
// Mock Analysis Service
// ============================================================================

/// Returns queued outcomes and records every call
#[derive(Default)]
pub struct MockAnalysisService {
    descriptions: Mutex<VecDeque<Result<String, AnalysisError>>>,
    posts: Mutex<VecDeque<Result<String, AnalysisError>>>,
    /// Byte length and language of each describe call
    describe_calls: Mutex<Vec<(usize, Language)>>,
    posts_calls: Mutex<Vec<(String, Language)>>,
}

impl MockAnalysisService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_description(&self, outcome: Result<String, AnalysisError>) {
        self.descriptions.lock().unwrap().push_back(outcome);
    }

    pub fn queue_posts(&self, outcome: Result<String, AnalysisError>) {
        self.posts.lock().unwrap().push_back(outcome);
    }

    pub fn describe_calls(&self) -> Vec<(usize, Language)> {
        self.describe_calls.lock().unwrap().clone()
    }

    pub fn posts_calls(&self) -> Vec<(String, Language)> {
        self.posts_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisService for MockAnalysisService {
    async fn describe_image(
        &self,
        image: &ImageBlob,
        language: Language,
    ) -> Result<String, AnalysisError> {
        self.describe_calls
            .lock()
            .unwrap()
            .push((image.len(), language));
        self.descriptions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AnalysisError::network("No mock response queued")))
    }

    async fn generate_posts(
        &self,
        description: &str,
        language: Language,
    ) -> Result<String, AnalysisError> {
        self.posts_calls
            .lock()
            .unwrap()
            .push((description.to_string(), language));
        self.posts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AnalysisError::network("No mock response queued")))
    }
}

// ============================================================================
// Gated Analysis Service
// ============================================================================

/// Holds every call open until the test releases it.
///
/// `started` is notified when a call begins. A call dropped before it is
/// released marks the service cancelled.
pub struct GatedAnalysisService {
    pub inner: MockAnalysisService,
    pub started: Notify,
    gate: Semaphore,
    cancelled: AtomicBool,
}

impl GatedAnalysisService {
    pub fn new() -> Self {
        Self {
            inner: MockAnalysisService::new(),
            started: Notify::new(),
            gate: Semaphore::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Let one held call finish
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn hold(&self) {
        let guard = CancelGuard {
            flag: &self.cancelled,
            armed: true,
        };
        self.started.notify_one();
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        guard.disarm();
    }
}

struct CancelGuard<'a> {
    flag: &'a AtomicBool,
    armed: bool,
}

impl CancelGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(true, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl AnalysisService for GatedAnalysisService {
    async fn describe_image(
        &self,
        image: &ImageBlob,
        language: Language,
    ) -> Result<String, AnalysisError> {
        self.hold().await;
        self.inner.describe_image(image, language).await
    }

    async fn generate_posts(
        &self,
        description: &str,
        language: Language,
    ) -> Result<String, AnalysisError> {
        self.hold().await;
        self.inner.generate_posts(description, language).await
    }
}
