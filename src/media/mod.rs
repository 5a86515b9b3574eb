use serde::{Deserialize, Serialize};

/// Opaque, transport-issued identifier of one uploaded media object.
pub type MediaReference = String;

/// Identifier of the chat a pending upload belongs to.
pub type ChatSessionId = i64;

/// The kinds of media the bot can index. Each kind owns its own keyword
/// index and index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Sticker,
    Photo,
    Animated,
}

impl MediaKind {
    /// Every kind, in declaration order.
    pub const ALL: [MediaKind; 3] = [MediaKind::Sticker, MediaKind::Photo, MediaKind::Animated];

    /// Order in which pending slots are checked when keywords arrive.
    pub const COMMIT_ORDER: [MediaKind; 3] =
        [MediaKind::Sticker, MediaKind::Photo, MediaKind::Animated];

    /// Order in which indexes are scanned for an inline query. Rarer kinds
    /// come first.
    pub const QUERY_ORDER: [MediaKind; 3] =
        [MediaKind::Animated, MediaKind::Sticker, MediaKind::Photo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sticker => "sticker",
            Self::Photo => "photo",
            Self::Animated => "animated",
        }
    }

    /// Default file name of this kind's persisted index.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::Sticker => "stickers.json",
            Self::Photo => "photos.json",
            Self::Animated => "gif.json",
        }
    }

    /// Word used in the upload acknowledgement ("cool video, bro...").
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Sticker => "sticker",
            Self::Photo => "photo",
            Self::Animated => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sticker" => Ok(Self::Sticker),
            "photo" => Ok(Self::Photo),
            "animated" | "gif" => Ok(Self::Animated),
            _ => Err(format!("invalid media kind: {s}")),
        }
    }
}
