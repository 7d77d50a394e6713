//! Item identity, metadata and the intake source boundary.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for items on a board.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ItemId(u64);

/// Rejected raw item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ItemIdError {
    #[error("item id 0 is reserved")]
    Zero,
    #[error("item id space exhausted")]
    Overflow,
}

impl ItemId {
    /// Construct from a raw non-zero value.
    pub fn new(raw: u64) -> Result<Self, ItemIdError> {
        if raw == 0 {
            return Err(ItemIdError::Zero);
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The following identifier.
    pub fn checked_next(self) -> Result<Self, ItemIdError> {
        self.0.checked_add(1).map(Self).ok_or(ItemIdError::Overflow)
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u64> for ItemId {
    type Error = ItemIdError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ItemId> for u64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload supplied by an [`ItemSource`] before the board assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub title: String,
    /// Renderer-side handle for the item's image, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
}

impl ItemDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            image_key: None,
        }
    }

    #[must_use]
    pub fn with_image_key(mut self, key: impl Into<String>) -> Self {
        self.image_key = Some(key.into());
        self
    }
}

/// Item metadata kept by a board session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
}

impl ItemRecord {
    #[must_use]
    pub fn from_draft(id: ItemId, draft: ItemDraft) -> Self {
        Self {
            id,
            title: draft.title,
            image_key: draft.image_key,
        }
    }
}

/// Supplies items one at a time on request.
pub trait ItemSource {
    /// Take the next item, or `None` once the source is exhausted.
    fn next_item(&mut self) -> Option<ItemDraft>;

    /// Items still waiting to be drawn.
    fn remaining(&self) -> usize;
}

/// In-memory FIFO item source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueItemSource {
    queue: VecDeque<ItemDraft>,
}

impl QueueItemSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, draft: ItemDraft) {
        self.queue.push_back(draft);
    }
}

impl<T: Into<String>> FromIterator<T> for QueueItemSource {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            queue: iter.into_iter().map(ItemDraft::new).collect(),
        }
    }
}

impl ItemSource for QueueItemSource {
    fn next_item(&mut self) -> Option<ItemDraft> {
        self.queue.pop_front()
    }

    fn remaining(&self) -> usize {
        self.queue.len()
    }
}
