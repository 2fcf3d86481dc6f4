//! Pure state transition function

use super::{ConversationState, Effect, Event, PendingCall, SocialChoice, Step};
use crate::analysis::AnalysisResult;
use crate::i18n::MessageId;
use crate::transcript::TranscriptEntry;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_step: Step,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(step: Step) -> Self {
        Self {
            new_step: step,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Reasons an event is not accepted
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{action} is not accepted while {}", .step.as_str())]
    NotAccepted { step: Step, action: &'static str },
    #[error("A remote call is already in flight")]
    CallInFlight,
    #[error("Completion arrived with no matching call in flight")]
    UnexpectedCompletion,
    #[error("No image description stored")]
    MissingDescription,
}

/// Pure transition function: same inputs, same outputs, no I/O.
pub fn transition(
    state: &ConversationState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let step = state.step();
    let pending = state.pending();

    if pending.is_some()
        && matches!(
            event,
            Event::ImageSubmitted { .. } | Event::SocialChoice { .. }
        )
    {
        return Err(TransitionError::CallInFlight);
    }

    match (step, event) {
        // ============================================================
        // Image upload
        // ============================================================
        (Step::AwaitingImage, Event::ImageSubmitted { image }) => {
            Ok(TransitionResult::new(Step::AnalyzingImage)
                .with_effect(Effect::append(TranscriptEntry::user_image(image.clone())))
                .with_effect(Effect::append(TranscriptEntry::assistant(
                    MessageId::Analyzing,
                )))
                .with_effect(Effect::DescribeImage { image }))
        }

        (Step::AnalyzingImage, Event::DescribeCompleted { result }) => {
            if pending != Some(PendingCall::DescribeImage) {
                return Err(TransitionError::UnexpectedCompletion);
            }
            match result {
                AnalysisResult::Described(description) => {
                    Ok(TransitionResult::new(Step::AwaitingSocialConfirmation)
                        .with_effect(Effect::StoreDescription(description.clone()))
                        .with_effect(Effect::append(TranscriptEntry::assistant_with_payload(
                            MessageId::ImageDescriptionPrefix,
                            description,
                        ))))
                }
                AnalysisResult::Failed(_) => Ok(TransitionResult::new(Step::AwaitingImage)
                    .with_effect(Effect::append(TranscriptEntry::assistant(
                        MessageId::ImageAnalysisError,
                    )))),
            }
        }

        // ============================================================
        // Social media confirmation
        // ============================================================
        (Step::AwaitingSocialConfirmation, Event::SocialChoice { choice }) => {
            let echo = Effect::append(TranscriptEntry::user_message(choice.message_id()));
            match choice {
                SocialChoice::No => Ok(TransitionResult::new(Step::AwaitingImage)
                    .with_effect(echo)
                    .with_effect(Effect::append(TranscriptEntry::assistant(
                        MessageId::NoProblem,
                    )))),
                SocialChoice::Yes => {
                    let description = state
                        .description()
                        .ok_or(TransitionError::MissingDescription)?;
                    Ok(TransitionResult::new(Step::AwaitingSocialConfirmation)
                        .with_effect(echo)
                        .with_effect(Effect::GeneratePosts {
                            description: description.to_string(),
                        }))
                }
            }
        }

        (Step::AwaitingSocialConfirmation, Event::PostsCompleted { result }) => {
            if pending != Some(PendingCall::GeneratePosts) {
                return Err(TransitionError::UnexpectedCompletion);
            }
            match result {
                AnalysisResult::Described(posts) => Ok(TransitionResult::new(Step::AwaitingImage)
                    .with_effect(Effect::append(TranscriptEntry::assistant_with_payload(
                        MessageId::SocialMediaPostsPrefix,
                        posts,
                    )))
                    .with_effect(Effect::append(TranscriptEntry::assistant(
                        MessageId::ReadyForAnother,
                    )))),
                // No way back from here but a new session
                AnalysisResult::Failed(_) => Ok(TransitionResult::new(Step::Idle).with_effect(
                    Effect::append(TranscriptEntry::assistant(MessageId::SocialMediaError)),
                )),
            }
        }

        // ============================================================
        // Free text: recorded, never routed
        // ============================================================
        (step, Event::TextSubmitted { text }) if step != Step::AnalyzingImage => {
            if text.trim().is_empty() {
                return Err(TransitionError::NotAccepted {
                    step,
                    action: "submit_text",
                });
            }
            Ok(TransitionResult::new(step).with_effect(Effect::append(TranscriptEntry::user_text(text))))
        }

        (_, Event::DescribeCompleted { .. } | Event::PostsCompleted { .. }) => {
            Err(TransitionError::UnexpectedCompletion)
        }

        (step, event) => Err(TransitionError::NotAccepted {
            step,
            action: event.action(),
        }),
    }
}
