use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{matching::MatchCandidate, utils, warning};

const CACHE_EXTENSION: &str = "tunematch.cache";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cannot write match cache: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode match cache: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A remembered resolution for one local track. An empty `catalog_id` records
/// that the track was confirmed to have no counterpart in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedTrackEntry {
    pub local_id: i64,
    pub local_track: String,
    pub catalog_track: String,
    pub catalog_id: String,
    pub score: f64,
}

impl CachedTrackEntry {
    pub fn is_no_match(&self) -> bool {
        self.catalog_id.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAlbumEntry {
    pub catalog_album: String,
    pub catalog_id: String,
    pub score: f64,
}

/// Match results that survive between runs, stored next to the library file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchCache {
    #[serde(skip)]
    path: PathBuf,
    #[serde(default)]
    tracks: BTreeMap<i64, CachedTrackEntry>,
    /// Keyed by the local album name, case-sensitive.
    #[serde(default)]
    albums: BTreeMap<String, CachedAlbumEntry>,
}

/// `Library.xml` caches to `Library.tunematch.cache` in the same directory.
pub fn cache_path_for(library_path: &Path) -> PathBuf {
    library_path.with_extension(CACHE_EXTENSION)
}

impl MatchCache {
    /// An empty cache that will be written to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Loads the cache belonging to a library file. A missing or unreadable
    /// cache file yields an empty cache.
    pub async fn load(library_path: &Path) -> Self {
        let path = cache_path_for(library_path);

        let content = match async_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Self::new(path),
            Err(e) => {
                warning!("Cannot read match cache {}: {}", path.display(), e);
                return Self::new(path);
            }
        };

        match serde_json::from_str::<MatchCache>(&content) {
            Ok(mut cache) => {
                cache.path = path;
                cache
            }
            Err(e) => {
                warning!(
                    "Match cache {} is corrupt, starting empty: {}",
                    path.display(),
                    e
                );
                Self::new(path)
            }
        }
    }

    /// Overwrites the cache file with the current contents.
    pub async fn save(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                async_fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_track_match(&self, local_id: i64) -> Option<&CachedTrackEntry> {
        self.tracks.get(&local_id)
    }

    pub fn store_track_match(&mut self, candidate: &MatchCandidate) {
        let entry = CachedTrackEntry {
            local_id: candidate.local.id,
            local_track: utils::render_local(&candidate.local),
            catalog_track: candidate.catalog_label(),
            catalog_id: candidate.catalog_id().unwrap_or_default().to_string(),
            score: candidate.score,
        };
        self.tracks.insert(candidate.local.id, entry);
    }

    pub fn get_album_match(&self, local_album: &str) -> Option<&CachedAlbumEntry> {
        self.albums.get(local_album)
    }

    pub fn store_album_match(
        &mut self,
        local_album: &str,
        catalog_album: &str,
        catalog_id: &str,
        score: f64,
    ) {
        self.albums.insert(
            local_album.to_string(),
            CachedAlbumEntry {
                catalog_album: catalog_album.to_string(),
                catalog_id: catalog_id.to_string(),
                score,
            },
        );
    }

    pub fn tracks(&self) -> impl Iterator<Item = &CachedTrackEntry> {
        self.tracks.values()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn album_count(&self) -> usize {
        self.albums.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogTrack, LocalTrack};

    #[test]
    fn cache_file_sits_next_to_library() {
        let path = cache_path_for(Path::new("/music/Library.xml"));
        assert_eq!(path, PathBuf::from("/music/Library.tunematch.cache"));
    }

    #[test]
    fn no_match_is_stored_with_empty_id() {
        let mut cache = MatchCache::default();
        let local = LocalTrack {
            id: 7,
            name: "Song".to_string(),
            ..Default::default()
        };
        cache.store_track_match(&MatchCandidate::no_match(local));

        let entry = cache.get_track_match(7).unwrap();
        assert!(entry.is_no_match());
        assert_eq!(entry.score, -1.0);
    }

    #[test]
    fn re_resolution_overwrites_entry() {
        let mut cache = MatchCache::default();
        let local = LocalTrack {
            id: 7,
            ..Default::default()
        };
        cache.store_track_match(&MatchCandidate::no_match(local.clone()));
        cache.store_track_match(&MatchCandidate::new(
            local,
            CatalogTrack {
                id: "abc".to_string(),
                ..Default::default()
            },
            0.1,
        ));

        assert_eq!(cache.track_count(), 1);
        assert_eq!(cache.get_track_match(7).unwrap().catalog_id, "abc");
    }
}
