//! The remote catalog seam.
//!
//! Everything that talks to the music catalog goes through [`CatalogClient`].
//! The Spotify implementation lives in [`crate::spotify::SpotifyClient`]; tests
//! substitute an in-memory fake.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{CatalogAlbum, CatalogPlaylist, CatalogTrack, CatalogUser};

/// Number of results the catalog returns per search page.
pub const SEARCH_PAGE_SIZE: u32 = 20;

/// Most ids accepted by one [`CatalogClient::get_tracks`] or
/// [`CatalogClient::add_tracks_to_library`] call.
pub const MAX_IDS_PER_REQUEST: usize = 50;

/// Most tracks accepted by one [`CatalogClient::add_tracks_to_playlist`] call.
pub const MAX_URIS_PER_REQUEST: usize = 100;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("rate limited by the catalog")]
    RateLimited { retry_after: Option<Duration> },

    #[error("catalog responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not authorized: {0}")]
    Auth(String),
}

impl CatalogError {
    /// Whether the failed call should be re-issued unchanged after a pause.
    ///
    /// Only "too many requests" qualifies. Every other failure is surfaced to
    /// the caller immediately.
    pub fn is_retry_worthy(&self) -> bool {
        match self {
            CatalogError::RateLimited { .. } => true,
            CatalogError::Status { status, .. } => *status == 429,
            _ => false,
        }
    }

    /// The pause the server asked for, if it named one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CatalogError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Searches tracks and collects at most `max_pages` pages of results
    /// (`max_pages * SEARCH_PAGE_SIZE` tracks).
    async fn search_tracks(
        &self,
        query: &str,
        max_pages: u32,
    ) -> Result<Vec<CatalogTrack>, CatalogError>;

    async fn get_track(&self, id: &str) -> Result<CatalogTrack, CatalogError>;

    async fn get_album(&self, id: &str) -> Result<CatalogAlbum, CatalogError>;

    /// Fetches full track records. Unknown ids are dropped from the result.
    async fn get_tracks(&self, ids: &[String]) -> Result<Vec<CatalogTrack>, CatalogError>;

    async fn add_tracks_to_library(&self, ids: &[String]) -> Result<(), CatalogError>;

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
    ) -> Result<CatalogPlaylist, CatalogError>;

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        ids: &[String],
    ) -> Result<(), CatalogError>;

    async fn current_user(&self) -> Result<CatalogUser, CatalogError>;
}
