//! # CLI Module
//!
//! User-facing commands. Each command loads what it needs, reports progress
//! with the logging macros and exits through `error!` on failures it cannot
//! recover from.
//!
//! - [`auth`] - Spotify OAuth 2.0 PKCE authorization
//! - [`import`] - match a whole library and write it back to Spotify
//! - [`match_track`] - resolve a single library track
//! - [`list_matches`] - show the persistent match cache

mod auth;
mod import;
mod matches;
mod prompt;
mod single;

use std::{path::Path, sync::Arc};

pub use auth::auth;
pub use import::import;
pub use matches::list_matches;
pub use prompt::{ConsoleDisambiguator, parse_answer};
pub use single::match_track;

use crate::{
    catalog::CatalogClient,
    config, error, info,
    library::Library,
    management::MatchCache,
    matching::{Resolver, ResolverOptions},
    retry::RetryPolicy,
    spotify::SpotifyClient,
};

async fn load_library(path: &Path) -> Library {
    match Library::load(path).await {
        Ok(library) => {
            info!(
                "Read {} tracks and {} playlists from {}",
                library.tracks().len(),
                library.playlists().len(),
                path.display()
            );
            library
        }
        Err(e) => error!("Cannot load library: {}", e),
    }
}

async fn connect() -> Arc<dyn CatalogClient> {
    match SpotifyClient::from_saved_token().await {
        Ok(client) => Arc::new(client),
        Err(e) => error!(
            "Failed to load token. Please run tunematch auth\n Error: {}",
            e
        ),
    }
}

async fn resolver_for(
    library_path: &Path,
    client: Arc<dyn CatalogClient>,
    options: ResolverOptions,
) -> Resolver {
    let cache = MatchCache::load(library_path).await;
    info!(
        "Loaded {} cached track matches from {}",
        cache.track_count(),
        cache.path().display()
    );

    Resolver::new(
        client,
        cache,
        Box::new(ConsoleDisambiguator::new()),
        options,
    )
    .with_retry(RetryPolicy::new(config::rate_limit_backoff()))
}
