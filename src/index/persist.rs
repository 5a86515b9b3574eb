//! On-disk format of a keyword index: one JSON object per media kind,
//! `{ "<keyword>": ["<reference>", ...] }`.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::{IndexError, KeywordIndex};

/// Read the index stored at `path`.
///
/// A missing or blank file is an empty index, not an error.
pub fn load(path: &Path) -> Result<KeywordIndex, IndexError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(KeywordIndex::default());
        }
        Err(source) => {
            return Err(IndexError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if content.trim().is_empty() {
        return Ok(KeywordIndex::default());
    }

    serde_json::from_str(&content).map_err(|source| IndexError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize `index` and replace the file at `path` with it.
pub fn save(path: &Path, index: &KeywordIndex) -> Result<(), IndexError> {
    let bytes = serde_json::to_vec(index)?;
    write_atomic(path, &bytes)
}

/// Write `bytes` to a temporary file next to `path`, flush it to disk, then
/// rename it over `path`. Readers see either the old or the new content.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    let write_err = |source: std::io::Error| IndexError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Move a malformed index file out of the way so the next save cannot
/// overwrite it. Returns the new location.
pub fn quarantine(path: &Path) -> Result<PathBuf, IndexError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index.json".to_string());
    let target = path.with_file_name(format!(
        "{file_name}.corrupt-{}",
        chrono::Utc::now().timestamp()
    ));

    std::fs::rename(path, &target).map_err(|source| IndexError::Write {
        path: target.clone(),
        source,
    })?;
    Ok(target)
}
