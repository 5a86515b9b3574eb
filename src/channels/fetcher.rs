use anyhow::Result;
use async_trait::async_trait;

/// Downloads the raw bytes of a media object by its transport reference.
///
/// The caption endpoint uses this to get the photo it draws on.
#[async_trait]
pub trait MediaFetcher: Send + Sync + 'static {
    /// Fetch the media named by `reference`.
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>>;
}
