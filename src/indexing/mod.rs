use std::sync::Arc;

use tracing::{debug, info};

use crate::index::{IndexError, IndexStore};
use crate::media::{ChatSessionId, MediaKind};
use crate::sessions::PendingUploadTracker;

/// Result of offering a text message to [`IndexingSession::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The chat had no pending upload; the text is not a keyword list.
    NotPending,
    /// The pending upload was indexed under `keywords`.
    Committed {
        kind: MediaKind,
        keywords: Vec<String>,
    },
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Split a keyword message on commas, trimming and lower-casing each piece.
///
/// Empty pieces are kept: `"cat,"` yields `["cat", ""]`.
pub fn parse_keywords(text: &str) -> Vec<String> {
    text.split(',')
        .map(|word| word.trim().to_lowercase())
        .collect()
}

// ============================================================================
// Indexing Session
// ============================================================================

/// Attaches keywords sent by a chat to the upload that chat has pending.
#[derive(Clone)]
pub struct IndexingSession {
    pending: Arc<PendingUploadTracker>,
    store: Arc<IndexStore>,
}

impl IndexingSession {
    pub fn new(pending: Arc<PendingUploadTracker>, store: Arc<IndexStore>) -> Self {
        Self { pending, store }
    }

    /// Index the pending upload of `session` under the keywords in `text`
    /// and persist that kind's index.
    ///
    /// Commits to at most one kind, the first in [`MediaKind::COMMIT_ORDER`]
    /// with a pending upload. A failed save is returned as an error but the
    /// in-memory index keeps the new entries.
    pub fn commit(&self, session: ChatSessionId, text: &str) -> Result<CommitOutcome, IndexError> {
        for kind in MediaKind::COMMIT_ORDER {
            if !self.store.contains(kind) {
                continue;
            }

            let Some(reference) = self.pending.take_if_pending(session, kind) else {
                continue;
            };

            let keywords = parse_keywords(text);
            self.store.append(kind, &keywords, &reference)?;
            self.store.save(kind)?;

            info!(
                chat_id = session,
                kind = %kind,
                keywords = keywords.len(),
                "indexed upload"
            );
            return Ok(CommitOutcome::Committed { kind, keywords });
        }

        debug!(chat_id = session, "no pending upload; ignoring text");
        Ok(CommitOutcome::NotPending)
    }
}
