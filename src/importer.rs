//! Import of a whole library: resolve every track, then write the matches
//! back to the catalog as saved tracks and playlists.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    catalog::{CatalogClient, CatalogError, MAX_IDS_PER_REQUEST, MAX_URIS_PER_REQUEST},
    info,
    library::Library,
    management::MissingLog,
    matching::{Resolver, ResolverOptions},
    retry::{self, RetryPolicy},
    success,
    types::LocalTrack,
    utils, warning,
};

/// Name of the playlist that receives the whole library.
pub const LIBRARY_PLAYLIST_NAME: &str = "iTunes Library";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot get current user: {0}")]
    CurrentUser(#[source] CatalogError),
}

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub add_to_library: bool,
    pub library_as_playlist: bool,
    pub import_playlists: bool,
    pub prefer_original: bool,
    pub guess_matching: bool,
    pub import_disabled: bool,
    pub public_playlists: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            add_to_library: false,
            library_as_playlist: true,
            import_playlists: true,
            prefer_original: true,
            guess_matching: true,
            import_disabled: false,
            public_playlists: false,
        }
    }
}

impl ImportOptions {
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            prefer_original: self.prefer_original,
            guess_matching: self.guess_matching,
            ..Default::default()
        }
    }
}

/// Podcasts, videos, iTunes U and TV shows are never imported; unchecked
/// tracks only on request.
pub fn should_skip(track: &LocalTrack, import_disabled: bool) -> bool {
    if track.podcast || track.video || track.audiobook || track.tv_show {
        return true;
    }
    track.disabled && !import_disabled
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub saved_to_library: usize,
    pub playlists_created: usize,
    pub missing: usize,
}

pub struct Importer<'a> {
    library: &'a Library,
    client: Arc<dyn CatalogClient>,
    resolver: Resolver,
    options: ImportOptions,
    missing: MissingLog,
    retry: RetryPolicy,
}

impl<'a> Importer<'a> {
    pub fn new(
        library: &'a Library,
        client: Arc<dyn CatalogClient>,
        resolver: Resolver,
        options: ImportOptions,
    ) -> Self {
        Self {
            library,
            client,
            resolver,
            options,
            missing: MissingLog::for_library(library.path()),
            retry: RetryPolicy::default(),
        }
    }

    /// Policy for write-back calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn missing(&self) -> &MissingLog {
        &self.missing
    }

    pub async fn run(&mut self) -> Result<ImportSummary, ImportError> {
        let library = self.library;
        let mut summary = ImportSummary::default();

        info!("Gathering necessary data...");
        let client = Arc::clone(&self.client);
        let user = retry::until_ready(&self.retry, || client.current_user())
            .await
            .map_err(ImportError::CurrentUser)?;

        if self.options.add_to_library || self.options.library_as_playlist {
            info!("Matching {} library tracks...", library.tracks().len());
            let ids = self
                .resolve_all(library.tracks().iter(), LIBRARY_PLAYLIST_NAME)
                .await;

            if self.options.add_to_library && self.save_to_library(&ids).await {
                summary.saved_to_library = ids.len();
            }

            if self.options.library_as_playlist
                && self
                    .create_and_fill(&user.id, LIBRARY_PLAYLIST_NAME, &ids)
                    .await
            {
                summary.playlists_created += 1;
            }
        }

        if self.options.import_playlists {
            for playlist in library.playlists().iter().filter(|p| !p.is_system()) {
                info!("Importing {}...", playlist.name);
                let tracks = playlist
                    .track_ids
                    .iter()
                    .filter_map(|id| library.track(*id));
                let ids = self.resolve_all(tracks, &playlist.name).await;

                if self.create_and_fill(&user.id, &playlist.name, &ids).await {
                    summary.playlists_created += 1;
                }
            }
        }

        if let Err(e) = self.resolver.flush_cache().await {
            warning!("Cannot save match cache: {}", e);
        }

        summary.missing = self.missing.len();
        if !self.missing.is_empty() {
            match self.missing.save().await {
                Ok(()) => info!(
                    "{} tracks could not be imported, see {}",
                    summary.missing,
                    self.missing.path().display()
                ),
                Err(e) => warning!("Cannot save missing log: {}", e),
            }
        }

        success!(
            "Import finished: {} playlists created, {} tracks missing",
            summary.playlists_created,
            summary.missing
        );
        Ok(summary)
    }

    /// Resolves tracks bound for `destination`, in order, and returns the
    /// catalog ids found. Everything else lands in the missing log.
    async fn resolve_all(
        &mut self,
        tracks: impl Iterator<Item = &'a LocalTrack>,
        destination: &str,
    ) -> Vec<String> {
        let tracks: Vec<&LocalTrack> = tracks.collect();
        let total = tracks.len();
        let mut ids = Vec::with_capacity(total);

        for (n, track) in tracks.into_iter().enumerate() {
            if should_skip(track, self.options.import_disabled) {
                info!("Skipping {}", utils::render_local(track));
                self.missing.log(destination, track);
                continue;
            }

            info!("{:04}/{:04}: {}", n + 1, total, utils::render_local(track));
            let candidate = self.resolver.resolve(track).await;
            match candidate.catalog_id() {
                Some(id) => ids.push(id.to_string()),
                None => self.missing.log(destination, track),
            }
        }

        ids
    }

    async fn save_to_library(&self, ids: &[String]) -> bool {
        let client = self.client.as_ref();
        let pb = utils::spinner(format!("Adding {} tracks to your library...", ids.len()));

        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let saved =
                retry::until_ready(&self.retry, || client.add_tracks_to_library(chunk)).await;
            if let Err(e) = saved {
                pb.finish_and_clear();
                warning!("Error adding tracks to library: {}", e);
                return false;
            }
        }

        pb.finish_and_clear();
        true
    }

    async fn create_and_fill(&self, user_id: &str, name: &str, ids: &[String]) -> bool {
        let client = self.client.as_ref();
        let public = self.options.public_playlists;

        let playlist = match retry::until_ready(&self.retry, || {
            client.create_playlist(user_id, name, public)
        })
        .await
        {
            Ok(playlist) => playlist,
            Err(e) => {
                warning!("Error creating playlist {}: {}", name, e);
                return false;
            }
        };

        let pb = utils::spinner(format!("Adding {} tracks to {}...", ids.len(), name));
        for chunk in ids.chunks(MAX_URIS_PER_REQUEST) {
            let added = retry::until_ready(&self.retry, || {
                client.add_tracks_to_playlist(&playlist.id, chunk)
            })
            .await;
            if let Err(e) = added {
                pb.finish_and_clear();
                warning!("Error adding tracks to playlist {}: {}", name, e);
                return false;
            }
        }

        pb.finish_and_clear();
        true
    }
}
