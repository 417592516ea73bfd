//! Weighted similarity scoring between a local track and a catalog track.
//!
//! Scores are distances: `0.0` is an exact match and larger is worse. Each
//! field comparison is bounded by `1 / weight` so that a vetoed field alone
//! pushes the weighted total past 1.0.

use std::sync::LazyLock;

use regex::Regex;
use strsim::levenshtein;

use crate::{
    matching::normalize::{CLEAN_TIER, COMPLEX_TIER, Replacement, SIMPLE_TIER},
    types::{CatalogTrack, LocalTrack},
};

pub const TITLE_WEIGHT: f64 = 0.5;
pub const ARTIST_WEIGHT: f64 = 0.3;
pub const ALBUM_WEIGHT: f64 = 0.1;
pub const POPULARITY_WEIGHT: f64 = 0.1;

/// Added when the caller prefers original releases and the candidate sits on
/// a compilation.
pub const COMPILATION_PENALTY: f64 = 0.1;

pub const CLEAN_FLOOR: f64 = 0.025;
pub const SIMPLE_FLOOR: f64 = 0.05;
pub const COMPLEX_FLOOR: f64 = 0.95;

/// Score returned when one of the albums is unknown.
const UNKNOWN_ALBUM_SCORE: f64 = 0.5;

fn patterns(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|s| Regex::new(s).expect("veto pattern must compile"))
        .collect()
}

static TITLE_VETOES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| patterns(&[r"\blive\b", "karaoke", "instrumental", "cover"]));

static ARTIST_VETOES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| patterns(&["karaoke", r"\bcast\b", "soundtrack"]));

static ALBUM_VETOES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[r"\blive\b", "karaoke", r"\bcast\b", "soundtrack", "cover"])
});

// Albums matching any of these always get a full string comparison, even
// when the caller asked for the lenient one.
static FULL_ALBUM_COMPARE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"\boriginal (\w+ )?cast\b",
        r"\bcast\b",
        r"\bbroadway cast\b",
        r"\blondon cast\b",
        r"\bsoundtrack\b",
        r"\bmotion picture\b",
        r"\bmusical\b",
    ])
});

fn normalize(s: &str) -> String {
    s.to_lowercase().trim().to_string()
}

/// True when exactly one side matches one of the veto patterns.
fn vetoed(vetoes: &[Regex], a: &str, b: &str) -> bool {
    vetoes.iter().any(|re| re.is_match(a) != re.is_match(b))
}

/// Levenshtein distance divided by the longer string's length, in characters.
fn relative_distance(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    levenshtein(a, b) as f64 / longest as f64
}

/// Base string distance refined through the normalization tiers.
///
/// Each tier rewrites both strings cumulatively. After every rewrite the
/// distance is recomputed and offered as `floor + distance`; the lowest
/// offer wins. Hitting a tier's floor exactly ends the search since nothing
/// in that tier or later can beat it.
pub fn s_compare_score(a: &str, b: &str) -> f64 {
    let mut a = a.to_string();
    let mut b = b.to_string();
    let mut score = relative_distance(&a, &b);

    let tiers: [(&[Replacement], f64); 3] = [
        (CLEAN_TIER.as_slice(), CLEAN_FLOOR),
        (SIMPLE_TIER.as_slice(), SIMPLE_FLOOR),
        (COMPLEX_TIER.as_slice(), COMPLEX_FLOOR),
    ];

    for (tier, floor) in tiers {
        if score < floor {
            return score;
        }
        for replacement in tier {
            a = replacement.apply(&a);
            b = replacement.apply(&b);
            score = score.min(floor + relative_distance(&a, &b));
            if score == floor {
                return floor;
            }
        }
    }

    score
}

pub fn title_compare(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if vetoed(&TITLE_VETOES, &a, &b) {
        return 1.0 / TITLE_WEIGHT;
    }

    s_compare_score(&a, &b)
}

/// Compares artist credits regardless of the order names appear in.
pub fn artist_compare(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if vetoed(&ARTIST_VETOES, &a, &b) {
        return 1.0 / ARTIST_WEIGHT;
    }

    s_compare_score(&sorted_tokens(&a), &sorted_tokens(&b))
}

fn sorted_tokens(s: &str) -> String {
    let mut parts: Vec<&str> = s.split(' ').collect();
    parts.sort_unstable();
    parts.join(" ")
}

/// Compares album names.
///
/// With `simple_compare` the album only counts when one side looks like a
/// cast recording or soundtrack; any other pair scores 0.
pub fn album_compare(a: &str, b: &str, simple_compare: bool) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    let needs_full_compare = FULL_ALBUM_COMPARE
        .iter()
        .any(|re| re.is_match(&a) || re.is_match(&b));
    if simple_compare && !needs_full_compare {
        return 0.0;
    }

    if a.is_empty() || b.is_empty() {
        return UNKNOWN_ALBUM_SCORE;
    }

    if vetoed(&ALBUM_VETOES, &a, &b) {
        return 1.0 / ALBUM_WEIGHT;
    }

    s_compare_score(&a, &b)
}

pub fn is_compilation(album_type: &str) -> bool {
    matches!(
        album_type.to_lowercase().as_str(),
        "compilation" | "consolidation"
    )
}

/// Weighted distance between a local track and a catalog candidate.
pub fn track_compare(
    local: &LocalTrack,
    candidate: &CatalogTrack,
    prefer_original: bool,
    ignore_album: bool,
) -> f64 {
    let mut score = TITLE_WEIGHT * title_compare(&local.name, &candidate.name);
    score += ARTIST_WEIGHT * artist_compare(&local.artist, &candidate.artist());
    score += ALBUM_WEIGHT * album_compare(&local.album, &candidate.album.name, ignore_album);

    if prefer_original && is_compilation(&candidate.album.album_type) {
        score += COMPILATION_PENALTY;
    }

    let popularity = f64::from(candidate.popularity.min(100)) / 100.0;
    score + (1.0 - popularity) * POPULARITY_WEIGHT
}
