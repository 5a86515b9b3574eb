use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::index::IndexStore;
use crate::media::{MediaKind, MediaReference};

/// Suffix appended to the result id of a captioned photo.
pub const CAPTIONED_ID_SUFFIX: &str = ",captioned";

// ============================================================================
// Query Parsing
// ============================================================================

/// An inline query split into its search prefix and optional caption text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub prefix: String,
    pub top: String,
    pub bottom: String,
}

impl ParsedQuery {
    /// Parse `"prefix[,bottom]"` or `"prefix,top,bottom"`.
    ///
    /// Segments after the third are ignored.
    pub fn parse(raw: &str) -> Self {
        let mut segments = raw.split(',');
        let prefix = segments.next().unwrap_or_default().to_string();
        let rest: Vec<&str> = segments.collect();

        let (top, bottom) = match rest.as_slice() {
            [] => ("", ""),
            [bottom] => ("", *bottom),
            [top, bottom, ..] => (*top, *bottom),
        };

        Self {
            prefix,
            top: top.to_string(),
            bottom: bottom.to_string(),
        }
    }

    /// Whether a captioned rendering was asked for.
    pub fn wants_caption(&self) -> bool {
        !self.top.is_empty() || !self.bottom.is_empty()
    }

    /// The prefix as it is matched against stored keywords.
    pub fn normalized_prefix(&self) -> String {
        self.prefix.to_lowercase()
    }
}

// ============================================================================
// Results
// ============================================================================

/// Where the client gets the media of a result from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum ResultSource {
    /// Media already stored by the transport, addressed by its reference.
    Cached(MediaReference),
    /// Media rendered on demand by the caption endpoint.
    Rendered(Url),
}

/// One entry of an inline answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineResult {
    pub id: String,
    pub kind: MediaKind,
    pub source: ResultSource,
}

/// Ranked results plus how long the client may cache them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnswer {
    pub results: Vec<InlineResult>,
    pub cache_time_secs: u32,
}

/// Limits applied by [`QueryResolver`].
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Public URL the caption endpoint is reachable at.
    pub caption_base_url: Url,
    pub max_results: usize,
    pub cache_time_secs: u32,
}

// ============================================================================
// Query Resolver
// ============================================================================

/// Turns a partial keyword into inline results across every kind index.
#[derive(Clone)]
pub struct QueryResolver {
    store: Arc<IndexStore>,
    settings: ResolverSettings,
}

impl QueryResolver {
    pub fn new(store: Arc<IndexStore>, settings: ResolverSettings) -> Self {
        Self { store, settings }
    }

    /// Resolve a raw inline query.
    ///
    /// Order: captioned photos (when a caption is requested), animations,
    /// stickers, plain photos. References are deduplicated within each kind
    /// and keep the order they were first met in, scanning keywords
    /// lexicographically. An empty prefix matches every keyword.
    pub fn resolve(&self, raw: &str) -> QueryAnswer {
        let query = ParsedQuery::parse(raw);
        let prefix = query.normalized_prefix();

        let animated = self.collect(MediaKind::Animated, &prefix);
        let stickers = self.collect(MediaKind::Sticker, &prefix);
        let photos = self.collect(MediaKind::Photo, &prefix);

        let mut results = Vec::with_capacity(
            animated.len() + stickers.len() + photos.len() * (1 + query.wants_caption() as usize),
        );

        if query.wants_caption() {
            results.extend(photos.iter().map(|reference| InlineResult {
                id: format!("{reference}{CAPTIONED_ID_SUFFIX}"),
                kind: MediaKind::Photo,
                source: ResultSource::Rendered(self.caption_url(reference, &query.top, &query.bottom)),
            }));
        }
        results.extend(cached(MediaKind::Animated, animated));
        results.extend(cached(MediaKind::Sticker, stickers));
        results.extend(cached(MediaKind::Photo, photos));

        results.truncate(self.settings.max_results);

        QueryAnswer {
            results,
            cache_time_secs: self.settings.cache_time_secs,
        }
    }

    /// `{base}/{reference}/{top}/{bottom}` with each segment percent-encoded.
    pub fn caption_url(&self, reference: &str, top: &str, bottom: &str) -> Url {
        caption_url(&self.settings.caption_base_url, reference, top, bottom)
    }

    fn collect(&self, kind: MediaKind, prefix: &str) -> Vec<MediaReference> {
        self.store
            .read(kind, |index| {
                let mut seen = HashSet::new();
                index
                    .prefix_matches(prefix)
                    .flat_map(|(_, refs)| refs.iter())
                    .filter(|reference| seen.insert(reference.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn cached(kind: MediaKind, references: Vec<MediaReference>) -> impl Iterator<Item = InlineResult> {
    references.into_iter().map(move |reference| InlineResult {
        id: reference.clone(),
        kind,
        source: ResultSource::Cached(reference),
    })
}

/// Build the caption endpoint URL for `reference`.
///
/// `base` must be able to carry a path (any `http`/`https` URL); this is
/// checked when the configuration is validated.
pub fn caption_url(base: &Url, reference: &str, top: &str, bottom: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(reference).push(top).push(bottom);
    }
    url
}
