//! Runtime for live conversation sessions
//!
//! Each session runs its [`ConversationController`] on its own task. Clients
//! talk to it through a [`SessionHandle`]: commands in, [`SessionEvent`]s out.

mod controller;

#[cfg(test)]
pub mod testing;

pub use controller::ConversationController;

use crate::analysis::AnalysisService;
use crate::i18n::{resolve, Language};
use crate::state_machine::{Affordances, ConversationState, PendingCall, SocialChoice, Step};
use crate::transcript::{ImageBlob, RenderedEntry};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio_util::sync::CancellationToken;

/// Requests a client can make of a session
#[derive(Debug)]
pub enum Command {
    SubmitImage(ImageBlob),
    ConfirmSocialPosts(SocialChoice),
    SubmitText(String),
    SetLanguage(Language),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

/// Events pushed to subscribed clients
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Entry {
        entry: RenderedEntry,
    },
    StepChange {
        step: Step,
        affordances: Affordances,
        pending: Option<PendingCall>,
    },
    /// Everything re-renders after a language switch
    LanguageChange {
        snapshot: SessionSnapshot,
    },
}

/// Rendered view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub step: Step,
    pub affordances: Affordances,
    pub placeholder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub pending: Option<PendingCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_label: Option<String>,
    pub language: Language,
    pub entries: Vec<RenderedEntry>,
}

impl SessionSnapshot {
    pub fn capture(session_id: &str, state: &ConversationState) -> Self {
        let language = state.language();
        let affordances = state.affordances();
        Self {
            session_id: session_id.to_string(),
            step: state.step(),
            affordances,
            placeholder: resolve(affordances.placeholder, language, None),
            prompt: affordances.prompt.map(|id| resolve(id, language, None)),
            pending: state.pending(),
            pending_label: state.pending().map(|p| resolve(p.label(), language, None)),
            language,
            entries: state.transcript().render(language),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session has ended")]
    Closed,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub command_tx: mpsc::Sender<Command>,
    pub broadcast_tx: broadcast::Sender<SessionEvent>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    pub async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Snapshot(reply_tx)).await?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }
}

/// Sessions with no commands, completions or subscribers for this long are evicted
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Registry of live sessions. Nothing outlives the process.
pub struct SessionManager {
    analysis: Arc<dyn AnalysisService>,
    default_language: Language,
    idle_timeout: Duration,
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionManager {
    pub fn new(analysis: Arc<dyn AnalysisService>, default_language: Language) -> Self {
        Self {
            analysis,
            default_language,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Start a session: welcome entry appended, waiting for an image
    pub async fn create(&self, language: Option<Language>) -> (String, SessionHandle) {
        let session_id = uuid::Uuid::new_v4().to_string();
        let language = language.unwrap_or(self.default_language);

        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let shutdown = CancellationToken::new();

        let controller = ConversationController::new(
            session_id.clone(),
            language,
            self.analysis.clone(),
            broadcast_tx.clone(),
        );

        let run_shutdown = shutdown.clone();
        let run_id = session_id.clone();
        let idle_timeout = self.idle_timeout;
        let registry = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            controller.run(command_rx, run_shutdown, idle_timeout).await;
            // Already gone when ended explicitly; this covers idle eviction
            registry.write().await.remove(&run_id);
            tracing::info!(session_id = %run_id, "Session runtime finished");
        });

        let handle = SessionHandle {
            command_tx,
            broadcast_tx,
            shutdown,
        };

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), handle.clone());

        let active = self.active_sessions().await;
        tracing::info!(
            session_id = %session_id,
            language = %language,
            active,
            "Session created"
        );
        (session_id, handle)
    }

    pub async fn get(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    pub async fn send(&self, session_id: &str, command: Command) -> Result<(), SessionError> {
        self.get(session_id).await?.send(command).await
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        self.get(session_id).await?.snapshot().await
    }

    /// Subscribe, then take the snapshot the stream starts from
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SessionEvent>), SessionError> {
        let handle = self.get(session_id).await?;
        let rx = handle.subscribe();
        let snapshot = handle.snapshot().await?;
        Ok((snapshot, rx))
    }

    /// End a session, cancelling any remote call it has in flight
    pub async fn end(&self, session_id: &str) -> Result<(), SessionError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        handle.shutdown.cancel();
        let active = self.active_sessions().await;
        tracing::info!(session_id = %session_id, active, "Session ended");
        Ok(())
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockAnalysisService;
    use super::*;
    use crate::i18n::MessageId;
    use std::time::Duration;

    fn manager(mock: Arc<MockAnalysisService>) -> SessionManager {
        SessionManager::new(mock, Language::En)
    }

    async fn wait_for_step(handle: &SessionHandle, step: Step) -> SessionSnapshot {
        for _ in 0..100 {
            let snapshot = handle.snapshot().await.unwrap();
            if snapshot.step == step && snapshot.pending.is_none() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session never reached {step:?}");
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn lifecycle_futures_are_send() {
        // axum handlers require Send futures
        let sessions = manager(Arc::new(MockAnalysisService::new()));
        let create = sessions.create(None);
        assert_send(&create);
        let (id, _) = create.await;

        let end = sessions.end(&id);
        assert_send(&end);
        end.await.unwrap();
    }

    #[tokio::test]
    async fn create_starts_with_welcome() {
        let sessions = manager(Arc::new(MockAnalysisService::new()));
        let (id, handle) = sessions.create(Some(Language::Pt)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.session_id, id);
        assert_eq!(snapshot.step, Step::AwaitingImage);
        assert_eq!(snapshot.language, Language::Pt);
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(
            snapshot.entries[0].text.as_deref(),
            Some(resolve(MessageId::Welcome, Language::Pt, None).as_str())
        );
        assert_eq!(snapshot.placeholder, "Digite sua mensagem...");
        assert_eq!(sessions.active_sessions().await, 1);
    }

    #[tokio::test]
    async fn default_language_applies_when_none_given() {
        let sessions = SessionManager::new(Arc::new(MockAnalysisService::new()), Language::Es);
        let (id, _) = sessions.create(None).await;
        assert_eq!(sessions.snapshot(&id).await.unwrap().language, Language::Es);
    }

    #[tokio::test]
    async fn commands_drive_the_conversation() {
        let mock = Arc::new(MockAnalysisService::new());
        mock.queue_description(Ok("a red car".to_string()));
        let sessions = manager(mock.clone());
        let (id, handle) = sessions.create(None).await;
        let mut events = handle.subscribe();

        sessions
            .send(
                &id,
                Command::SubmitImage(ImageBlob::new(vec![1u8, 2], "image/png")),
            )
            .await
            .unwrap();

        let snapshot = wait_for_step(&handle, Step::AwaitingSocialConfirmation).await;
        assert_eq!(snapshot.entries.len(), 4);
        assert_eq!(
            snapshot.prompt.as_deref(),
            Some("Would you like me to generate social media posts based on this description?")
        );

        // image, analyzing, description entries were pushed to subscribers
        let mut pushed = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SessionEvent::Entry { .. }) {
                pushed += 1;
            }
        }
        assert_eq!(pushed, 3);
    }

    #[tokio::test]
    async fn language_switch_rerenders_transcript() {
        let sessions = manager(Arc::new(MockAnalysisService::new()));
        let (id, handle) = sessions.create(None).await;
        let mut events = handle.subscribe();

        sessions
            .send(&id, Command::SetLanguage(Language::Es))
            .await
            .unwrap();

        let snapshot = sessions.snapshot(&id).await.unwrap();
        assert_eq!(snapshot.language, Language::Es);
        assert_eq!(
            snapshot.entries[0].text.as_deref(),
            Some(resolve(MessageId::Welcome, Language::Es, None).as_str())
        );

        match events.try_recv().unwrap() {
            SessionEvent::LanguageChange { snapshot } => {
                assert_eq!(snapshot.language, Language::Es);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn ended_session_is_gone() {
        let sessions = manager(Arc::new(MockAnalysisService::new()));
        let (id, handle) = sessions.create(None).await;

        sessions.end(&id).await.unwrap();
        assert_eq!(sessions.active_sessions().await, 0);
        assert_eq!(
            sessions.snapshot(&id).await.unwrap_err(),
            SessionError::NotFound(id.clone())
        );
        assert_eq!(sessions.end(&id).await.unwrap_err(), SessionError::NotFound(id));

        // The runtime stops, so stale handles see a closed session
        let mut closed = false;
        for _ in 0..100 {
            if matches!(handle.snapshot().await, Err(SessionError::Closed)) {
                closed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(closed);
    }

    #[tokio::test]
    async fn idle_session_is_evicted() {
        let sessions = manager(Arc::new(MockAnalysisService::new()))
            .with_idle_timeout(Duration::from_millis(30));
        let (id, handle) = sessions.create(None).await;

        let mut evicted = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if sessions.active_sessions().await == 0 {
                evicted = true;
                break;
            }
        }
        assert!(evicted);
        assert_eq!(
            sessions.snapshot(&id).await.unwrap_err(),
            SessionError::NotFound(id)
        );
        assert!(matches!(handle.snapshot().await, Err(SessionError::Closed)));
    }

    #[tokio::test]
    async fn subscribed_session_outlives_idle_timeout() {
        let sessions = manager(Arc::new(MockAnalysisService::new()))
            .with_idle_timeout(Duration::from_millis(20));
        let (id, handle) = sessions.create(None).await;
        let events = handle.subscribe();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sessions.active_sessions().await, 1);

        drop(events);
        let mut evicted = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if sessions.get(&id).await.is_err() {
                evicted = true;
                break;
            }
        }
        assert!(evicted);
    }
}
