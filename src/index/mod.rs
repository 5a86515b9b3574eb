mod error;
pub mod persist;

pub use error::IndexError;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::media::{MediaKind, MediaReference};

// ============================================================================
// Keyword Index
// ============================================================================

/// Keyword → references, in insertion order. Never deduplicated on write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordIndex {
    entries: BTreeMap<String, Vec<MediaReference>>,
}

impl KeywordIndex {
    /// Append `reference` under `keyword`, creating the keyword if needed.
    pub fn append(&mut self, keyword: &str, reference: &str) {
        self.entries
            .entry(keyword.to_string())
            .or_default()
            .push(reference.to_string());
    }

    /// References stored under exactly `keyword`.
    pub fn get(&self, keyword: &str) -> Option<&[MediaReference]> {
        self.entries.get(keyword).map(Vec::as_slice)
    }

    /// Every `(keyword, references)` pair whose keyword starts with `prefix`,
    /// in lexicographic keyword order. An empty prefix yields every keyword.
    pub fn prefix_matches<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [MediaReference])> + 'a {
        self.entries
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(move |(keyword, _)| keyword.starts_with(prefix))
            .map(|(keyword, refs)| (keyword.as_str(), refs.as_slice()))
    }

    pub fn keyword_count(&self) -> usize {
        self.entries.len()
    }

    /// Total stored references, counting repeats.
    pub fn reference_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Index Store
// ============================================================================

/// Per-kind keyword counts reported by [`IndexStore::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub kind: MediaKind,
    pub path: PathBuf,
    pub keywords: usize,
    pub references: usize,
}

struct KindIndex {
    path: PathBuf,
    entries: RwLock<KeywordIndex>,
    /// Serializes snapshot + write so the file always ends on the newest
    /// snapshot.
    save_lock: Mutex<()>,
}

/// Owns one lockable [`KeywordIndex`] per media kind together with the file
/// it is persisted to.
///
/// Each kind is locked independently: a commit on photos never blocks a
/// query against stickers, and disk writes happen outside the index lock.
pub struct IndexStore {
    indexes: HashMap<MediaKind, KindIndex>,
}

impl IndexStore {
    /// Load every configured kind from disk.
    ///
    /// A missing file starts that kind empty. A malformed file is moved aside
    /// and that kind starts empty; other kinds are unaffected.
    pub fn open<I>(files: I) -> Self
    where
        I: IntoIterator<Item = (MediaKind, PathBuf)>,
    {
        Self::load(files, Recovery::Quarantine)
    }

    /// Like [`IndexStore::open`], but a malformed file is only reported and
    /// left where it is. For inspection commands that must not touch disk.
    pub fn open_read_only<I>(files: I) -> Self
    where
        I: IntoIterator<Item = (MediaKind, PathBuf)>,
    {
        Self::load(files, Recovery::Report)
    }

    fn load<I>(files: I, recovery: Recovery) -> Self
    where
        I: IntoIterator<Item = (MediaKind, PathBuf)>,
    {
        let indexes = files
            .into_iter()
            .map(|(kind, path)| {
                let entries = load_or_recover(kind, &path, recovery);
                info!(
                    kind = %kind,
                    path = %path.display(),
                    keywords = entries.keyword_count(),
                    "keyword index loaded"
                );
                (kind, KindIndex::new(path, entries))
            })
            .collect();

        Self { indexes }
    }

    /// Build a store from already-loaded indexes without touching the disk.
    pub fn from_indexes<I>(indexes: I) -> Self
    where
        I: IntoIterator<Item = (MediaKind, PathBuf, KeywordIndex)>,
    {
        Self {
            indexes: indexes
                .into_iter()
                .map(|(kind, path, entries)| (kind, KindIndex::new(path, entries)))
                .collect(),
        }
    }

    /// Whether an index is registered for `kind`.
    pub fn contains(&self, kind: MediaKind) -> bool {
        self.indexes.contains_key(&kind)
    }

    /// Append `reference` under each keyword in the index of `kind`.
    ///
    /// The whole batch is applied under one write lock, so readers observe
    /// either none or all of it.
    pub fn append(
        &self,
        kind: MediaKind,
        keywords: &[String],
        reference: &str,
    ) -> Result<(), IndexError> {
        let slot = self.slot(kind)?;
        let mut entries = slot.entries.write();
        for keyword in keywords {
            entries.append(keyword, reference);
        }
        Ok(())
    }

    /// Write the current state of the index of `kind` to its file.
    pub fn save(&self, kind: MediaKind) -> Result<(), IndexError> {
        let slot = self.slot(kind)?;
        let _guard = slot.save_lock.lock();

        let bytes = {
            let entries = slot.entries.read();
            serde_json::to_vec(&*entries)?
        };

        persist::write_atomic(&slot.path, &bytes)?;
        debug!(kind = %kind, path = %slot.path.display(), bytes = bytes.len(), "keyword index saved");
        Ok(())
    }

    /// Run `f` against a consistent view of the index of `kind`.
    pub fn read<R>(&self, kind: MediaKind, f: impl FnOnce(&KeywordIndex) -> R) -> Option<R> {
        self.indexes.get(&kind).map(|slot| f(&slot.entries.read()))
    }

    /// Copy of the index of `kind`.
    pub fn snapshot(&self, kind: MediaKind) -> Option<KeywordIndex> {
        self.read(kind, KeywordIndex::clone)
    }

    /// Keyword and reference counts for every registered kind.
    pub fn stats(&self) -> Vec<IndexStats> {
        let mut stats: Vec<IndexStats> = self
            .indexes
            .iter()
            .map(|(kind, slot)| {
                let entries = slot.entries.read();
                IndexStats {
                    kind: *kind,
                    path: slot.path.clone(),
                    keywords: entries.keyword_count(),
                    references: entries.reference_count(),
                }
            })
            .collect();
        stats.sort_by_key(|s| s.kind);
        stats
    }

    fn slot(&self, kind: MediaKind) -> Result<&KindIndex, IndexError> {
        self.indexes.get(&kind).ok_or(IndexError::UnknownKind(kind))
    }
}

impl KindIndex {
    fn new(path: PathBuf, entries: KeywordIndex) -> Self {
        Self {
            path,
            entries: RwLock::new(entries),
            save_lock: Mutex::new(()),
        }
    }
}

/// What to do with a malformed index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    Quarantine,
    Report,
}

fn load_or_recover(kind: MediaKind, path: &Path, recovery: Recovery) -> KeywordIndex {
    match persist::load(path) {
        Ok(entries) => entries,
        Err(e @ IndexError::Malformed { .. }) => {
            warn!(kind = %kind, "{e}; starting with an empty index");
            if recovery == Recovery::Quarantine {
                match persist::quarantine(path) {
                    Ok(moved) => warn!(kind = %kind, "malformed index preserved at {}", moved.display()),
                    Err(e) => warn!(kind = %kind, "could not preserve malformed index: {e}"),
                }
            }
            KeywordIndex::default()
        }
        Err(e) => {
            warn!(kind = %kind, "{e}; starting with an empty index");
            KeywordIndex::default()
        }
    }
}
