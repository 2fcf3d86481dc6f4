//! Events that can occur in a conversation

use crate::analysis::AnalysisResult;
use crate::i18n::MessageId;
use crate::transcript::ImageBlob;
use serde::{Deserialize, Serialize};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    ImageSubmitted { image: ImageBlob },
    SocialChoice { choice: SocialChoice },
    TextSubmitted { text: String },

    // Remote call completions
    DescribeCompleted { result: AnalysisResult },
    PostsCompleted { result: AnalysisResult },
}

impl Event {
    /// Short name used in logs and rejection errors
    pub fn action(&self) -> &'static str {
        match self {
            Event::ImageSubmitted { .. } => "submit_image",
            Event::SocialChoice { .. } => "confirm_social_posts",
            Event::TextSubmitted { .. } => "submit_text",
            Event::DescribeCompleted { .. } => "describe_completed",
            Event::PostsCompleted { .. } => "posts_completed",
        }
    }

    pub fn is_user_action(&self) -> bool {
        matches!(
            self,
            Event::ImageSubmitted { .. } | Event::SocialChoice { .. } | Event::TextSubmitted { .. }
        )
    }
}

/// Answer to the social media posts offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialChoice {
    Yes,
    No,
}

impl SocialChoice {
    /// Label echoed into the transcript
    pub fn message_id(self) -> MessageId {
        match self {
            SocialChoice::Yes => MessageId::YesButton,
            SocialChoice::No => MessageId::NoButton,
        }
    }
}
