use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    catalog::{CatalogClient, CatalogError, MAX_IDS_PER_REQUEST},
    info,
    management::{CacheError, MatchCache},
    matching::{
        MatchCandidate, THRESHOLD_MATCHED, accepted_prefix, by_score,
        normalize::{extract_featured_artists, search_attempts},
        score::track_compare,
    },
    retry::{self, RetryPolicy},
    types::{CatalogAlbum, CatalogTrack, LocalTrack},
    utils, warning,
};

/// Added to a search result's score for every position it sits below the
/// top of its result page.
pub const SEARCH_RANK_PENALTY: f64 = 0.025;

/// Candidates offered to a human at once.
pub const MAX_OPTIONS: usize = 10;

/// What a human answered when asked to pick a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Index into the options that were shown.
    Pick(usize),
    NoneOfTheAbove,
    /// Free text to search the catalog with instead.
    CustomSearch(String),
}

pub trait Disambiguator: Send {
    /// Asks which of `options` corresponds to `local`. `options` may be empty,
    /// in which case only a custom search or giving up make sense.
    fn choose(&mut self, local: &LocalTrack, options: &[MatchCandidate]) -> Selection;
}

#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    /// Penalize candidates that only appear on compilations.
    pub prefer_original: bool,
    /// Take the best candidate when several clear the threshold instead of
    /// asking.
    pub guess_matching: bool,
    /// Result pages fetched per search query.
    pub search_pages: u32,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            prefer_original: true,
            guess_matching: true,
            search_pages: 2,
        }
    }
}

/// Resolves local tracks to catalog tracks, one at a time.
///
/// Answers are remembered for the session and written through to the
/// persistent [`MatchCache`] after every new resolution.
pub struct Resolver {
    client: Arc<dyn CatalogClient>,
    cache: MatchCache,
    disambiguator: Box<dyn Disambiguator>,
    options: ResolverOptions,
    retry: RetryPolicy,
    session: HashMap<i64, MatchCandidate>,
    /// Local album name to catalog album id, for albums matched this run.
    session_albums: HashMap<String, String>,
    /// Catalog album id to the album and its full tracks.
    albums: HashMap<String, (CatalogAlbum, Vec<CatalogTrack>)>,
}

impl Resolver {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        cache: MatchCache,
        disambiguator: Box<dyn Disambiguator>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            client,
            cache,
            disambiguator,
            options,
            retry: RetryPolicy::default(),
            session: HashMap::new(),
            session_albums: HashMap::new(),
            albums: HashMap::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &MatchCache {
        &self.cache
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Writes the persistent cache to disk.
    pub async fn flush_cache(&self) -> Result<(), CacheError> {
        self.cache.save().await
    }

    /// Finds the catalog track for `local`, or the no-match sentinel.
    pub async fn resolve(&mut self, local: &LocalTrack) -> MatchCandidate {
        if let Some(candidate) = self.session.get(&local.id) {
            return candidate.clone();
        }

        if let Some(candidate) = self.rehydrate(local).await {
            self.remember(&candidate);
            return candidate;
        }

        let goal = extract_featured_artists(local);
        let candidate = self.find_match(local, &goal).await;
        self.commit(candidate).await
    }

    async fn rehydrate(&self, local: &LocalTrack) -> Option<MatchCandidate> {
        let entry = self.cache.get_track_match(local.id)?;
        if entry.is_no_match() {
            return Some(MatchCandidate::no_match(local.clone()));
        }

        let (id, score) = (entry.catalog_id.clone(), entry.score);
        match self.fetch_track(&id).await {
            Ok(track) => Some(MatchCandidate::new(local.clone(), track, score)),
            Err(e) => {
                warning!(
                    "Cannot load cached match {} for {}: {}",
                    id,
                    utils::render_local(local),
                    e
                );
                None
            }
        }
    }

    async fn find_match(&mut self, local: &LocalTrack, goal: &LocalTrack) -> MatchCandidate {
        if let Some(candidate) = self.match_from_album(local, goal).await {
            return candidate;
        }

        let mut pool: Vec<MatchCandidate> = Vec::new();
        for query in search_attempts(goal) {
            let results = match self.search(&query, self.options.search_pages).await {
                Ok(results) => results,
                Err(e) => {
                    warning!("Search for {} failed: {}", query, e);
                    continue;
                }
            };

            if self.absorb(&mut pool, local, goal, results) == 0 {
                continue;
            }

            if let Some(candidate) = self.pick_accepted(&pool) {
                return candidate;
            }
        }

        // Albums are often named differently in the catalog, so give every
        // candidate another chance without them.
        for candidate in pool.iter_mut() {
            if let Some(track) = &candidate.track {
                candidate.score = track_compare(goal, track, self.options.prefer_original, true);
            }
        }
        pool.sort_by(by_score);

        if let Some(candidate) = self.pick_accepted(&pool) {
            return candidate;
        }

        self.ask(local, goal, pool).await
    }

    /// Scores only the tracks of an album this local album already mapped to.
    async fn match_from_album(
        &mut self,
        local: &LocalTrack,
        goal: &LocalTrack,
    ) -> Option<MatchCandidate> {
        if goal.album.is_empty() {
            return None;
        }

        let album_id = match self.session_albums.get(&goal.album) {
            Some(id) => id.clone(),
            None => self.cache.get_album_match(&goal.album)?.catalog_id.clone(),
        };
        if album_id.is_empty() {
            return None;
        }

        let (album, tracks) = self.album_with_tracks(&album_id).await?;

        let mut scored: Vec<MatchCandidate> = tracks
            .into_iter()
            .map(|track| {
                let score = track_compare(goal, &track, self.options.prefer_original, false);
                MatchCandidate::new(local.clone(), track, score)
            })
            .collect();
        scored.sort_by(by_score);

        let best = scored.into_iter().next()?;
        if best.score <= THRESHOLD_MATCHED {
            Some(best.with_album(album))
        } else {
            None
        }
    }

    async fn album_with_tracks(&mut self, album_id: &str) -> Option<(CatalogAlbum, Vec<CatalogTrack>)> {
        if let Some(cached) = self.albums.get(album_id) {
            return Some(cached.clone());
        }

        let album = match self.fetch_album(album_id).await {
            Ok(album) => album,
            Err(e) => {
                warning!("Cannot load album {}: {}", album_id, e);
                return None;
            }
        };

        let ids: Vec<String> = album.tracks.iter().map(|t| t.id.clone()).collect();
        let mut tracks = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            match self.fetch_tracks(chunk).await {
                Ok(found) => tracks.extend(found),
                Err(e) => {
                    warning!("Cannot load tracks of album {}: {}", album.name, e);
                    return None;
                }
            }
        }

        self.albums
            .insert(album_id.to_string(), (album.clone(), tracks.clone()));
        Some((album, tracks))
    }

    /// Adds search results not already pooled, scored with their rank bias,
    /// and re-sorts the pool. Returns how many were added.
    ///
    /// The bias counts positions among the new results only, so a track that
    /// a later query lists behind already pooled ones is not pushed down.
    fn absorb(
        &self,
        pool: &mut Vec<MatchCandidate>,
        local: &LocalTrack,
        goal: &LocalTrack,
        results: Vec<CatalogTrack>,
    ) -> usize {
        let mut seen: HashSet<String> = pool.iter().map(MatchCandidate::catalog_label).collect();
        let fresh: Vec<CatalogTrack> = results
            .into_iter()
            .filter(|track| seen.insert(utils::render_catalog(Some(track))))
            .collect();
        let added = fresh.len();

        for (rank, track) in fresh.into_iter().enumerate() {
            let score = track_compare(goal, &track, self.options.prefer_original, false)
                + rank as f64 * SEARCH_RANK_PENALTY;
            pool.push(MatchCandidate::new(local.clone(), track, score));
        }

        pool.sort_by(by_score);
        added
    }

    fn pick_accepted(&self, pool: &[MatchCandidate]) -> Option<MatchCandidate> {
        let accepted = accepted_prefix(pool);
        match accepted.len() {
            0 => None,
            1 => Some(accepted[0].clone()),
            _ if self.options.guess_matching => Some(accepted[0].clone()),
            _ => None,
        }
    }

    async fn ask(
        &mut self,
        local: &LocalTrack,
        goal: &LocalTrack,
        pool: Vec<MatchCandidate>,
    ) -> MatchCandidate {
        let mut options: Vec<MatchCandidate> = pool.into_iter().take(MAX_OPTIONS).collect();

        loop {
            match self.disambiguator.choose(local, &options) {
                Selection::Pick(index) if index < options.len() => {
                    return options.swap_remove(index);
                }
                Selection::Pick(_) | Selection::NoneOfTheAbove => {
                    return MatchCandidate::no_match(local.clone());
                }
                Selection::CustomSearch(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        return MatchCandidate::no_match(local.clone());
                    }

                    let results = match self.search(text, 1).await {
                        Ok(results) => results,
                        Err(e) => {
                            warning!("Search for {} failed: {}", text, e);
                            return MatchCandidate::no_match(local.clone());
                        }
                    };

                    options = results
                        .into_iter()
                        .take(MAX_OPTIONS)
                        .map(|track| {
                            let score =
                                track_compare(goal, &track, self.options.prefer_original, false);
                            MatchCandidate::new(local.clone(), track, score)
                        })
                        .collect();
                }
            }
        }
    }

    fn remember(&mut self, candidate: &MatchCandidate) {
        self.session.insert(candidate.local.id, candidate.clone());
        if let Some(track) = &candidate.track {
            if !candidate.local.album.is_empty() {
                self.session_albums
                    .insert(candidate.local.album.clone(), track.album.id.clone());
            }
        }
    }

    async fn commit(&mut self, candidate: MatchCandidate) -> MatchCandidate {
        info!("  @{:1.4}  {}", candidate.score, candidate.catalog_label());

        self.remember(&candidate);
        self.cache.store_track_match(&candidate);
        if let Some(track) = &candidate.track {
            if !candidate.local.album.is_empty() {
                self.cache.store_album_match(
                    &candidate.local.album,
                    &track.album.name,
                    &track.album.id,
                    candidate.score,
                );
            }
        }

        if let Err(e) = self.cache.save().await {
            warning!("Cannot save match cache: {}", e);
        }

        candidate
    }

    async fn search(&self, query: &str, pages: u32) -> Result<Vec<CatalogTrack>, CatalogError> {
        let client = self.client.as_ref();
        retry::until_ready(&self.retry, || client.search_tracks(query, pages)).await
    }

    async fn fetch_track(&self, id: &str) -> Result<CatalogTrack, CatalogError> {
        let client = self.client.as_ref();
        retry::until_ready(&self.retry, || client.get_track(id)).await
    }

    async fn fetch_album(&self, id: &str) -> Result<CatalogAlbum, CatalogError> {
        let client = self.client.as_ref();
        retry::until_ready(&self.retry, || client.get_album(id)).await
    }

    async fn fetch_tracks(&self, ids: &[String]) -> Result<Vec<CatalogTrack>, CatalogError> {
        let client = self.client.as_ref();
        retry::until_ready(&self.retry, || client.get_tracks(ids)).await
    }
}
