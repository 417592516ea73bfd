//! # Matching Engine
//!
//! Resolves local library tracks to catalog tracks.
//!
//! - [`normalize`] turns a local track into progressively looser search
//!   queries.
//! - [`score`] measures the distance between a local track and a candidate.
//! - [`resolver`] drives the per-track state machine: session cache,
//!   persistent cache, album pre-seed, staged search, album-blind re-score,
//!   and finally a human decision.
//!
//! Scores are distances. Anything at or below [`THRESHOLD_MATCHED`] is
//! accepted without asking.

pub mod normalize;
pub mod resolver;
pub mod score;

use std::cmp::Ordering;

use crate::{
    types::{CatalogAlbum, CatalogTrack, LocalTrack},
    utils,
};

pub use resolver::{Disambiguator, Resolver, ResolverOptions, Selection};

/// At or below this a candidate is accepted automatically.
pub const THRESHOLD_MATCHED: f64 = 0.15;
pub const THRESHOLD_LIKELY: f64 = 0.5;
pub const THRESHOLD_SIMILAR: f64 = 1.0;

/// Score carried by the "no match" sentinel.
pub const NO_MATCH_SCORE: f64 = -1.0;

/// A local track paired with one catalog candidate, or with nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub local: LocalTrack,
    pub track: Option<CatalogTrack>,
    /// The candidate's album, when it was already fetched.
    pub album: Option<CatalogAlbum>,
    pub score: f64,
}

impl MatchCandidate {
    pub fn new(local: LocalTrack, track: CatalogTrack, score: f64) -> Self {
        Self {
            local,
            track: Some(track),
            album: None,
            score,
        }
    }

    /// The explicit "nothing in the catalog corresponds" answer.
    pub fn no_match(local: LocalTrack) -> Self {
        Self {
            local,
            track: None,
            album: None,
            score: NO_MATCH_SCORE,
        }
    }

    pub fn with_album(mut self, album: CatalogAlbum) -> Self {
        self.album = Some(album);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.track.is_some()
    }

    pub fn catalog_id(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.id.as_str())
    }

    /// "title (artist)[album]" of the catalog side, used for audit and dedupe.
    pub fn catalog_label(&self) -> String {
        utils::render_catalog(self.track.as_ref())
    }

    /// The line shown to a human choosing between candidates.
    pub fn option_label(&self) -> String {
        format!("{} [{:1.4}]", self.catalog_label(), self.score)
    }
}

/// Pool ordering: candidates with a catalog track first, then by ascending
/// score. Used with a stable sort so ties keep their discovery order.
pub fn by_score(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    match (a.is_valid(), b.is_valid()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal),
    }
}

/// The leading run of candidates that clear the auto-accept threshold.
/// Expects `pool` sorted with [`by_score`].
pub fn accepted_prefix(pool: &[MatchCandidate]) -> &[MatchCandidate] {
    let end = pool
        .iter()
        .position(|c| !c.is_valid() || c.score > THRESHOLD_MATCHED)
        .unwrap_or(pool.len());
    &pool[..end]
}
