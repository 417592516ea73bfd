use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{types::LocalTrack, utils};

const MISSING_EXTENSION: &str = "tunematch.missing";

#[derive(Debug, Error)]
pub enum MissingLogError {
    #[error("cannot write missing log: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode missing log: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Tracks that could not be imported, grouped by the playlist they were
/// meant for.
#[derive(Debug, Default)]
pub struct MissingLog {
    path: PathBuf,
    entries: BTreeMap<String, Vec<String>>,
}

impl MissingLog {
    pub fn for_library(library_path: &Path) -> Self {
        Self {
            path: library_path.with_extension(MISSING_EXTENSION),
            entries: BTreeMap::new(),
        }
    }

    pub fn log(&mut self, destination: &str, track: &LocalTrack) {
        self.entries
            .entry(destination.to_string())
            .or_default()
            .push(utils::render_local(track));
    }

    pub fn entries(&self, destination: &str) -> &[String] {
        self.entries
            .get(destination)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self) -> Result<(), MissingLogError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }
}
