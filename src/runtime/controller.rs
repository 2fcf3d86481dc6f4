//! Conversation controller
//!
//! Sole owner and mutator of a session's [`ConversationState`]. User actions
//! and remote call completions go through the pure `transition`; remote calls
//! run as background tasks whose completion comes back as an [`Event`].

use super::{Command, SessionEvent, SessionSnapshot};
use crate::analysis::{AnalysisResult, AnalysisService};
use crate::i18n::Language;
use crate::state_machine::{transition, ConversationState, Effect, Event, SocialChoice};
use crate::transcript::ImageBlob;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub struct ConversationController<A>
where
    A: AnalysisService + ?Sized + 'static,
{
    session_id: String,
    state: ConversationState,
    analysis: Arc<A>,
    /// Completions of spawned remote calls
    completion_tx: mpsc::Sender<Event>,
    completion_rx: mpsc::Receiver<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    /// Token to cancel the remote call in flight
    call_cancel_token: Option<CancellationToken>,
}

impl<A> ConversationController<A>
where
    A: AnalysisService + ?Sized + 'static,
{
    pub fn new(
        session_id: impl Into<String>,
        language: Language,
        analysis: Arc<A>,
        broadcast_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(4);
        Self {
            session_id: session_id.into(),
            state: ConversationState::new(language),
            analysis,
            completion_tx,
            completion_rx,
            broadcast_tx,
            call_cancel_token: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.session_id, &self.state)
    }

    /// Upload an image. Ignored unless waiting for one.
    pub fn submit_image(&mut self, image: ImageBlob) -> bool {
        self.dispatch(Event::ImageSubmitted { image })
    }

    /// Answer the social media posts offer. Ignored unless it is open.
    pub fn confirm_social_posts(&mut self, choice: SocialChoice) -> bool {
        self.dispatch(Event::SocialChoice { choice })
    }

    /// Record free text. Ignored while an image is being analyzed.
    pub fn submit_text(&mut self, text: impl Into<String>) -> bool {
        self.dispatch(Event::TextSubmitted { text: text.into() })
    }

    pub fn set_language(&mut self, language: Language) {
        if self.state.language() == language {
            return;
        }
        self.state.set_language(language);
        tracing::info!(session_id = %self.session_id, language = %language, "Language changed");
        let _ = self.broadcast_tx.send(SessionEvent::LanguageChange {
            snapshot: self.snapshot(),
        });
    }

    /// Wait for the remote call in flight and fold its outcome in, as the
    /// run loop would. Returns false straight away when nothing is in flight.
    #[cfg(test)]
    pub async fn await_completion(&mut self) -> bool {
        if self.state.pending().is_none() {
            return false;
        }
        match self.completion_rx.recv().await {
            Some(event) => self.dispatch(event),
            None => false,
        }
    }

    /// Process commands and completions until shutdown.
    ///
    /// The session also stops once `idle_timeout` passes with no command, no
    /// completion and no subscriber.
    pub async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<Command>,
        shutdown: CancellationToken,
        idle_timeout: Duration,
    ) {
        tracing::info!(session_id = %self.session_id, "Starting session runtime");

        let idle = tokio::time::sleep(idle_timeout);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                command = command_rx.recv() => match command {
                    Some(command) => {
                        self.handle_command(command);
                        idle.as_mut().reset(Instant::now() + idle_timeout);
                    }
                    None => break,
                },
                Some(event) = self.completion_rx.recv() => {
                    self.dispatch(event);
                    idle.as_mut().reset(Instant::now() + idle_timeout);
                }
                () = &mut idle => {
                    if self.broadcast_tx.receiver_count() > 0 {
                        idle.as_mut().reset(Instant::now() + idle_timeout);
                    } else {
                        tracing::info!(session_id = %self.session_id, "Evicting idle session");
                        break;
                    }
                }
            }
        }

        self.cancel_call();
        tracing::info!(session_id = %self.session_id, "Session runtime stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SubmitImage(image) => {
                self.submit_image(image);
            }
            Command::ConfirmSocialPosts(choice) => {
                self.confirm_social_posts(choice);
            }
            Command::SubmitText(text) => {
                self.submit_text(text);
            }
            Command::SetLanguage(language) => self.set_language(language),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    /// Run one event through the state machine. Returns whether it was accepted.
    fn dispatch(&mut self, event: Event) -> bool {
        let action = event.action();
        let completes_call = !event.is_user_action();

        let result = match transition(&self.state, event) {
            Ok(result) => result,
            Err(e) => {
                // Rejected actions are no-ops; clients gate them on affordances
                tracing::debug!(
                    session_id = %self.session_id,
                    step = self.state.step().as_str(),
                    action,
                    error = %e,
                    "Ignoring action"
                );
                return false;
            }
        };

        if completes_call {
            self.call_cancel_token = None;
        }

        let applied = self.state.apply(result, completes_call);
        let language = self.state.language();

        for index in applied.appended.clone() {
            let entry = self.state.transcript().entries()[index].render(index, language);
            let _ = self.broadcast_tx.send(SessionEvent::Entry { entry });
        }

        if applied.previous_step != self.state.step() {
            tracing::info!(
                session_id = %self.session_id,
                action,
                from = applied.previous_step.as_str(),
                to = self.state.step().as_str(),
                "Step changed"
            );
        }
        let _ = self.broadcast_tx.send(SessionEvent::StepChange {
            step: self.state.step(),
            affordances: self.state.affordances(),
            pending: self.state.pending(),
        });

        if let Some(effect) = applied.remote_call {
            self.start_call(effect);
        }

        true
    }

    /// Spawn the remote call as a background task
    fn start_call(&mut self, effect: Effect) {
        let cancel_token = CancellationToken::new();
        self.call_cancel_token = Some(cancel_token.clone());

        let analysis = self.analysis.clone();
        let completion_tx = self.completion_tx.clone();
        let language = self.state.language();
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            let event = match effect {
                Effect::DescribeImage { image } => {
                    tracing::info!(session_id = %session_id, bytes = image.len(), "Requesting image description");
                    tokio::select! {
                        biased;

                        () = cancel_token.cancelled() => None,
                        outcome = analysis.describe_image(&image, language) => {
                            Some(Event::DescribeCompleted { result: AnalysisResult::from(outcome) })
                        }
                    }
                }
                Effect::GeneratePosts { description } => {
                    tracing::info!(session_id = %session_id, "Requesting social media posts");
                    tokio::select! {
                        biased;

                        () = cancel_token.cancelled() => None,
                        outcome = analysis.generate_posts(&description, language) => {
                            Some(Event::PostsCompleted { result: AnalysisResult::from(outcome) })
                        }
                    }
                }
                Effect::Append(_) | Effect::StoreDescription(_) => None,
            };

            match event {
                Some(event) => {
                    let _ = completion_tx.send(event).await;
                }
                None => {
                    tracing::info!(session_id = %session_id, "Remote call cancelled");
                }
            }
        });
    }

    fn cancel_call(&mut self) {
        if let Some(token) = self.call_cancel_token.take() {
            token.cancel();
        }
    }
}

impl<A> Drop for ConversationController<A>
where
    A: AnalysisService + ?Sized + 'static,
{
    fn drop(&mut self) {
        self.cancel_call();
    }
}
