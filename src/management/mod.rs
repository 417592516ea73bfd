mod auth;
mod cache;
mod missing;

pub use auth::TokenManager;
pub use cache::{CacheError, CachedAlbumEntry, CachedTrackEntry, MatchCache, cache_path_for};
pub use missing::{MissingLog, MissingLogError};
