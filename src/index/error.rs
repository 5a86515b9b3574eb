use std::path::PathBuf;

use crate::media::MediaKind;

/// Errors raised while loading or persisting a keyword index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to read index file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index file '{}' is malformed: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write index file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode index: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no index registered for media kind '{0}'")]
    UnknownKind(MediaKind),
}
