//! Effects produced by state transitions

use crate::transcript::{ImageBlob, TranscriptEntry};

/// Effects to be executed, in order, after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append an entry to the transcript
    Append(TranscriptEntry),

    /// Remember the latest description for the posts request
    StoreDescription(String),

    /// Ask the backend to describe an image (spawns as background task)
    DescribeImage { image: ImageBlob },

    /// Ask the backend for social media posts (spawns as background task)
    GeneratePosts { description: String },
}

impl Effect {
    pub fn append(entry: TranscriptEntry) -> Self {
        Effect::Append(entry)
    }
}
