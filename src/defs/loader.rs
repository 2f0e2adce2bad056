//! JSON definition loading
//!
//! Definitions live as `.json` files in a flat directory. A file holds
//! either a single definition object or an array of them. Files that fail
//! to parse are logged and skipped so one bad file cannot take down the
//! rest of the catalog.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::{DefsIndex, SequenceDef};
use crate::engine::error::{DefsError, DefsResult};

/// Shape of one definition file: a single definition or a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefsFile {
    One(SequenceDef),
    Many(Vec<SequenceDef>),
}

impl DefsFile {
    fn into_defs(self) -> Vec<SequenceDef> {
        match self {
            DefsFile::One(def) => vec![def],
            DefsFile::Many(defs) => defs,
        }
    }
}

/// Load every `.json` definition file directly inside `dir`
///
/// Subdirectories are not descended into. Unparseable files are skipped
/// with a warning; an unreadable directory is an error.
pub fn load_dir(dir: impl AsRef<Path>) -> DefsResult<DefsIndex> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(DefsError::DirNotFound(dir.to_path_buf()));
    }

    let mut index = DefsIndex::new();
    let mut loaded = 0usize;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        match load_file(&path) {
            Ok(defs) => {
                for def in defs {
                    tracing::debug!("Loaded {} '{}' from {}", def.kind, def.name, path.display());
                    index.insert(def);
                    loaded += 1;
                }
            }
            Err(err) => {
                tracing::warn!("Skipping definition file {}: {}", path.display(), err);
            }
        }
    }

    tracing::info!("Loaded {} definitions from {}", loaded, dir.display());
    Ok(index)
}

/// Parse one definition file into its definitions
pub fn load_file(path: impl AsRef<Path>) -> DefsResult<Vec<SequenceDef>> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    let file: DefsFile = serde_json::from_str(&data).map_err(|err| DefsError::InvalidFile {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;
    Ok(file.into_defs())
}
