use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::media::{ChatSessionId, MediaKind, MediaReference};

/// An upload waiting for the user to send its keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub kind: MediaKind,
    pub reference: MediaReference,
}

// ============================================================================
// Pending Upload Tracker
// ============================================================================

/// Remembers, per chat, the last uploaded media item that still needs
/// keywords.
///
/// A chat holds at most one pending upload across all kinds: a new upload
/// replaces whatever was pending before, whatever its kind. Each chat's slot
/// is updated under its own map entry lock, so chats never block each other
/// and operations on one chat are linearizable.
#[derive(Debug, Default)]
pub struct PendingUploadTracker {
    slots: DashMap<ChatSessionId, PendingUpload>,
}

impl PendingUploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an upload of `kind` for `session`, dropping any pending upload
    /// of that or any other kind. Returns the upload that was replaced.
    pub fn set(
        &self,
        session: ChatSessionId,
        kind: MediaKind,
        reference: impl Into<MediaReference>,
    ) -> Option<PendingUpload> {
        self.slots.insert(
            session,
            PendingUpload {
                kind,
                reference: reference.into(),
            },
        )
    }

    /// Remove and return the pending reference of `session` if it is of
    /// `kind`. Leaves a pending upload of another kind untouched.
    pub fn take_if_pending(
        &self,
        session: ChatSessionId,
        kind: MediaKind,
    ) -> Option<MediaReference> {
        match self.slots.entry(session) {
            Entry::Occupied(entry) if entry.get().kind == kind => {
                Some(entry.remove().reference)
            }
            _ => None,
        }
    }

    /// The pending upload of `session`, if any, without consuming it.
    pub fn peek(&self, session: ChatSessionId) -> Option<PendingUpload> {
        self.slots.get(&session).map(|entry| entry.value().clone())
    }

    /// Number of chats with an upload awaiting keywords.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
