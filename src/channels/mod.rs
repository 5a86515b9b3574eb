mod fetcher;
mod normalize;
pub mod telegram;

pub use fetcher::MediaFetcher;
pub use normalize::{normalize_message, InboundEvent};

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::index::IndexStore;
use crate::indexing::{CommitOutcome, IndexingSession};
use crate::media::MediaKind;
use crate::query::{QueryAnswer, QueryResolver, ResolverSettings};
use crate::sessions::PendingUploadTracker;

/// Reply sent once keywords have been stored.
pub const COMMIT_ACK: &str = "ok, cool";

/// Reply sent when an indexable upload arrives.
pub fn upload_ack(kind: MediaKind) -> String {
    format!(
        "cool {}, bro... send me some keywords (separated by commas)",
        kind.noun()
    )
}

// ============================================================================
// Bot Context
// ============================================================================

/// Everything a channel needs to turn inbound events into replies.
///
/// Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct BotContext {
    pending: Arc<PendingUploadTracker>,
    indexing: IndexingSession,
    resolver: QueryResolver,
}

impl BotContext {
    pub fn new(
        pending: Arc<PendingUploadTracker>,
        store: Arc<IndexStore>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            indexing: IndexingSession::new(Arc::clone(&pending), Arc::clone(&store)),
            resolver: QueryResolver::new(store, settings),
            pending,
        }
    }

    /// Apply `event` and return the reply to send to the chat, if any.
    ///
    /// Failures are logged and produce no reply.
    pub async fn handle(&self, event: InboundEvent) -> Option<String> {
        match event {
            InboundEvent::Upload {
                chat_id,
                kind,
                reference,
            } => {
                if let Some(replaced) = self.pending.set(chat_id, kind, reference) {
                    debug!(chat_id, kind = %replaced.kind, "dropped unconfirmed upload");
                }
                info!(chat_id, kind = %kind, "upload awaiting keywords");
                Some(upload_ack(kind))
            }
            InboundEvent::Text { chat_id, text } => {
                let indexing = self.indexing.clone();
                let committed =
                    tokio::task::spawn_blocking(move || indexing.commit(chat_id, &text)).await;

                match committed {
                    Ok(Ok(CommitOutcome::Committed { .. })) => Some(COMMIT_ACK.to_string()),
                    Ok(Ok(CommitOutcome::NotPending)) => None,
                    Ok(Err(e)) => {
                        error!(chat_id, "failed to persist keywords: {e}");
                        None
                    }
                    Err(e) => {
                        error!(chat_id, "keyword commit task failed: {e}");
                        None
                    }
                }
            }
            InboundEvent::Unsupported => None,
        }
    }

    /// Resolve an inline query.
    pub fn answer(&self, query: &str) -> QueryAnswer {
        self.resolver.resolve(query)
    }

    pub fn pending(&self) -> &PendingUploadTracker {
        &self.pending
    }
}
