#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tunematch::{
    catalog::{CatalogClient, CatalogError},
    matching::{Disambiguator, MatchCandidate, Selection},
    types::{
        AlbumRef, AlbumTrackRef, ArtistRef, CatalogAlbum, CatalogPlaylist, CatalogTrack,
        CatalogUser, LocalTrack,
    },
};

pub fn local_track(id: i64, name: &str, artist: &str, album: &str) -> LocalTrack {
    LocalTrack {
        id,
        name: name.to_string(),
        artist: artist.to_string(),
        album: album.to_string(),
        ..Default::default()
    }
}

pub fn catalog_track(
    id: &str,
    name: &str,
    artist: &str,
    album: &str,
    album_id: &str,
    popularity: u32,
) -> CatalogTrack {
    CatalogTrack {
        id: id.to_string(),
        uri: format!("spotify:track:{}", id),
        name: name.to_string(),
        artists: vec![ArtistRef {
            id: format!("{}-artist", id),
            name: artist.to_string(),
        }],
        album: AlbumRef {
            id: album_id.to_string(),
            name: album.to_string(),
            album_type: "album".to_string(),
        },
        popularity,
    }
}

pub fn yesterday() -> CatalogTrack {
    catalog_track("sp1", "Yesterday", "The Beatles", "Help!", "alb1", 70)
}

pub fn ticket_to_ride() -> CatalogTrack {
    catalog_track("sp2", "Ticket to Ride", "The Beatles", "Help!", "alb1", 70)
}

pub fn help_album() -> CatalogAlbum {
    CatalogAlbum {
        id: "alb1".to_string(),
        name: "Help!".to_string(),
        album_type: "album".to_string(),
        tracks: vec![
            AlbumTrackRef {
                id: "sp1".to_string(),
                name: "Yesterday".to_string(),
            },
            AlbumTrackRef {
                id: "sp2".to_string(),
                name: "Ticket to Ride".to_string(),
            },
        ],
    }
}

/// In-memory catalog that records every call it receives.
#[derive(Default)]
pub struct FakeCatalog {
    /// Results per exact query string.
    pub searches: HashMap<String, Vec<CatalogTrack>>,
    /// Results for any query not listed in `searches`.
    pub default_results: Vec<CatalogTrack>,
    pub tracks: HashMap<String, CatalogTrack>,
    pub albums: HashMap<String, CatalogAlbum>,
    pub user_fails: bool,
    /// Number of upcoming calls answered with a rate-limit error.
    pub rate_limits: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
    pub saved: Mutex<Vec<String>>,
    pub playlists: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeCatalog {
    pub fn with_search(mut self, query: &str, results: Vec<CatalogTrack>) -> Self {
        self.searches.insert(query.to_string(), results);
        self
    }

    pub fn with_default_results(mut self, results: Vec<CatalogTrack>) -> Self {
        self.default_results = results;
        self
    }

    pub fn with_track(mut self, track: CatalogTrack) -> Self {
        self.tracks.insert(track.id.clone(), track);
        self
    }

    pub fn with_album(mut self, album: CatalogAlbum) -> Self {
        self.albums.insert(album.id.clone(), album);
        self
    }

    pub fn with_rate_limits(self, count: usize) -> Self {
        self.rate_limits.store(count, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) -> Result<(), CatalogError> {
        self.calls.lock().unwrap().push(call);
        let remaining = self.rate_limits.load(Ordering::SeqCst);
        if remaining > 0 {
            self.rate_limits.store(remaining - 1, Ordering::SeqCst);
            return Err(CatalogError::RateLimited { retry_after: None });
        }
        Ok(())
    }

    fn not_found(what: &str) -> CatalogError {
        CatalogError::Status {
            status: 404,
            message: format!("{} not found", what),
        }
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn search_tracks(
        &self,
        query: &str,
        _max_pages: u32,
    ) -> Result<Vec<CatalogTrack>, CatalogError> {
        self.record(format!("search:{}", query))?;
        Ok(self
            .searches
            .get(query)
            .unwrap_or(&self.default_results)
            .clone())
    }

    async fn get_track(&self, id: &str) -> Result<CatalogTrack, CatalogError> {
        self.record(format!("get_track:{}", id))?;
        self.tracks
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn get_album(&self, id: &str) -> Result<CatalogAlbum, CatalogError> {
        self.record(format!("get_album:{}", id))?;
        self.albums
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn get_tracks(&self, ids: &[String]) -> Result<Vec<CatalogTrack>, CatalogError> {
        self.record(format!("get_tracks:{}", ids.join(",")))?;
        Ok(ids
            .iter()
            .filter_map(|id| self.tracks.get(id).cloned())
            .collect())
    }

    async fn add_tracks_to_library(&self, ids: &[String]) -> Result<(), CatalogError> {
        self.record(format!("save:{}", ids.len()))?;
        self.saved.lock().unwrap().extend(ids.iter().cloned());
        Ok(())
    }

    async fn create_playlist(
        &self,
        _user_id: &str,
        name: &str,
        _public: bool,
    ) -> Result<CatalogPlaylist, CatalogError> {
        self.record(format!("create_playlist:{}", name))?;
        let mut playlists = self.playlists.lock().unwrap();
        playlists.push((name.to_string(), Vec::new()));
        Ok(CatalogPlaylist {
            id: format!("pl{}", playlists.len() - 1),
            name: name.to_string(),
        })
    }

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        ids: &[String],
    ) -> Result<(), CatalogError> {
        self.record(format!("add_to_playlist:{}", playlist_id))?;
        let index: usize = playlist_id
            .trim_start_matches("pl")
            .parse()
            .map_err(|_| Self::not_found(playlist_id))?;
        let mut playlists = self.playlists.lock().unwrap();
        let playlist = playlists
            .get_mut(index)
            .ok_or_else(|| Self::not_found(playlist_id))?;
        playlist.1.extend(ids.iter().cloned());
        Ok(())
    }

    async fn current_user(&self) -> Result<CatalogUser, CatalogError> {
        self.record("current_user".to_string())?;
        if self.user_fails {
            return Err(CatalogError::Status {
                status: 500,
                message: "server error".to_string(),
            });
        }
        Ok(CatalogUser {
            id: "listener".to_string(),
            display_name: Some("Listener".to_string()),
        })
    }
}

/// Answers disambiguation questions from a fixed script, then gives up.
pub struct ScriptedDisambiguator {
    answers: VecDeque<Selection>,
    asked: Arc<AtomicUsize>,
    pub seen_options: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedDisambiguator {
    pub fn new(answers: Vec<Selection>) -> Self {
        Self {
            answers: answers.into(),
            asked: Arc::new(AtomicUsize::new(0)),
            seen_options: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared counter of questions asked.
    pub fn asked(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.asked)
    }
}

impl Disambiguator for ScriptedDisambiguator {
    fn choose(&mut self, _local: &LocalTrack, options: &[MatchCandidate]) -> Selection {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.seen_options
            .lock()
            .unwrap()
            .push(options.iter().map(|o| o.option_label()).collect());
        self.answers
            .pop_front()
            .unwrap_or(Selection::NoneOfTheAbove)
    }
}
