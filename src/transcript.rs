//! Append-only conversation transcript
//!
//! Entries stay presentation-agnostic: localized entries keep their
//! [`MessageId`] and are only turned into text by [`TranscriptEntry::render`].

use crate::i18n::{resolve, Language, MessageId};
use base64::Engine;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Who authored an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Uploaded image, opaque to the conversation
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBlob {
    data: Arc<[u8]>,
    content_type: String,
}

impl ImageBlob {
    pub fn new(data: impl Into<Arc<[u8]>>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{encoded}", self.content_type)
    }
}

// Image bytes are never useful in logs
impl fmt::Debug for ImageBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBlob")
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Body of a transcript entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    /// Literal text typed by the user
    Text(String),
    /// Catalog message, optionally followed by remote content
    Message {
        id: MessageId,
        payload: Option<String>,
    },
    Image(ImageBlob),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: EntryContent,
}

impl TranscriptEntry {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: EntryContent::Text(text.into()),
        }
    }

    pub fn user_message(id: MessageId) -> Self {
        Self {
            role: Role::User,
            content: EntryContent::Message { id, payload: None },
        }
    }

    pub fn user_image(image: ImageBlob) -> Self {
        Self {
            role: Role::User,
            content: EntryContent::Image(image),
        }
    }

    pub fn assistant(id: MessageId) -> Self {
        Self {
            role: Role::Assistant,
            content: EntryContent::Message { id, payload: None },
        }
    }

    pub fn assistant_with_payload(id: MessageId, payload: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: EntryContent::Message {
                id,
                payload: Some(payload.into()),
            },
        }
    }

    #[cfg(test)]
    pub fn message_id(&self) -> Option<MessageId> {
        match &self.content {
            EntryContent::Message { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Resolve to display form in the given language
    pub fn render(&self, index: usize, language: Language) -> RenderedEntry {
        match &self.content {
            EntryContent::Text(text) => RenderedEntry {
                index,
                role: self.role,
                kind: EntryKind::Text,
                text: Some(text.clone()),
                image: None,
            },
            EntryContent::Message { id, payload } => RenderedEntry {
                index,
                role: self.role,
                kind: EntryKind::Text,
                text: Some(resolve(*id, language, payload.as_deref())),
                image: None,
            },
            EntryContent::Image(blob) => RenderedEntry {
                index,
                role: self.role,
                kind: EntryKind::Image,
                text: None,
                image: Some(RenderedImage {
                    content_type: blob.content_type().to_string(),
                    data_url: blob.to_data_url(),
                    alt: resolve(MessageId::UploadedImageAlt, language, None),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Text,
    Image,
}

/// Transcript entry as shown to a client
#[derive(Debug, Clone, Serialize)]
pub struct RenderedEntry {
    pub index: usize,
    pub role: Role,
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<RenderedImage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedImage {
    pub content_type: String,
    pub data_url: String,
    pub alt: String,
}

/// Ordered record of every entry shown in a session. There is no removal.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, returning its index
    pub fn append(&mut self, entry: TranscriptEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn render(&self, language: Language) -> Vec<RenderedEntry> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.render(index, language))
            .collect()
    }
}
