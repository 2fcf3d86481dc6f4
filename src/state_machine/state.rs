//! Conversation state types

use super::{Effect, TransitionResult};
use crate::i18n::{Language, MessageId};
use crate::transcript::{Transcript, TranscriptEntry};
use serde::Serialize;
use std::ops::Range;

/// Phase of the guided conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Terminal after a failed posts request; only free text is accepted
    Idle,
    AwaitingImage,
    AnalyzingImage,
    AwaitingSocialConfirmation,
}

impl Step {
    #[cfg(test)]
    pub const ALL: [Step; 4] = [
        Step::Idle,
        Step::AwaitingImage,
        Step::AnalyzingImage,
        Step::AwaitingSocialConfirmation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Idle => "idle",
            Step::AwaitingImage => "awaiting_image",
            Step::AnalyzingImage => "analyzing_image",
            Step::AwaitingSocialConfirmation => "awaiting_social_confirmation",
        }
    }

    /// Input affordances for this step. Nothing else decides them.
    pub fn affordances(self) -> Affordances {
        match self {
            Step::Idle => Affordances {
                text_input: true,
                image_upload: false,
                confirmation: false,
                placeholder: MessageId::MessagePlaceholder,
                prompt: None,
            },
            Step::AwaitingImage => Affordances {
                text_input: true,
                image_upload: true,
                confirmation: false,
                placeholder: MessageId::MessagePlaceholder,
                prompt: None,
            },
            Step::AnalyzingImage => Affordances {
                text_input: false,
                image_upload: false,
                confirmation: false,
                placeholder: MessageId::ProcessingPlaceholder,
                prompt: None,
            },
            Step::AwaitingSocialConfirmation => Affordances {
                text_input: true,
                image_upload: false,
                confirmation: true,
                placeholder: MessageId::MessagePlaceholder,
                prompt: Some(MessageId::SocialMediaQuestion),
            },
        }
    }
}

/// Which inputs the client may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub text_input: bool,
    pub image_upload: bool,
    /// Yes/no buttons
    pub confirmation: bool,
    pub placeholder: MessageId,
    /// Question shown with the confirmation buttons
    pub prompt: Option<MessageId>,
}

/// Remote call currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingCall {
    DescribeImage,
    GeneratePosts,
}

impl PendingCall {
    /// Label shown while the call runs
    pub fn label(self) -> MessageId {
        match self {
            PendingCall::DescribeImage => MessageId::Analyzing,
            PendingCall::GeneratePosts => MessageId::Generating,
        }
    }
}

/// Everything one session knows. Mutated only by the conversation controller.
#[derive(Debug, Clone)]
pub struct ConversationState {
    step: Step,
    transcript: Transcript,
    description: Option<String>,
    language: Language,
    pending: Option<PendingCall>,
}

impl ConversationState {
    /// Fresh session: welcome entry appended, waiting for an image
    pub fn new(language: Language) -> Self {
        let mut transcript = Transcript::new();
        transcript.append(TranscriptEntry::assistant(MessageId::Welcome));
        Self {
            step: Step::AwaitingImage,
            transcript,
            description: None,
            language,
            pending: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn affordances(&self) -> Affordances {
        self.step.affordances()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn pending(&self) -> Option<PendingCall> {
        self.pending
    }

    pub(crate) fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Fold an accepted transition into the state.
    ///
    /// Local effects are applied here; the remote call, if any, is marked
    /// pending and handed back for the runtime to start.
    pub(crate) fn apply(&mut self, result: TransitionResult, completes_call: bool) -> Applied {
        let previous_step = self.step;
        let first = self.transcript.len();
        let mut remote_call = None;

        self.step = result.new_step;
        if completes_call {
            self.pending = None;
        }

        for effect in result.effects {
            match effect {
                Effect::Append(entry) => {
                    self.transcript.append(entry);
                }
                Effect::StoreDescription(description) => {
                    self.description = Some(description);
                }
                Effect::DescribeImage { .. } => {
                    self.pending = Some(PendingCall::DescribeImage);
                    remote_call = Some(effect);
                }
                Effect::GeneratePosts { .. } => {
                    self.pending = Some(PendingCall::GeneratePosts);
                    remote_call = Some(effect);
                }
            }
        }

        Applied {
            previous_step,
            appended: first..self.transcript.len(),
            remote_call,
        }
    }
}

/// What applying a transition changed
#[derive(Debug)]
pub struct Applied {
    pub previous_step: Step,
    /// Indices of the entries appended
    pub appended: Range<usize>,
    pub remote_call: Option<Effect>,
}
