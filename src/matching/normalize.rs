//! Text normalization tiers and search query generation.
//!
//! Names from the local library and from the catalog drift apart in
//! predictable ways. Three tiers of regex rewrites undo that drift, each one
//! more aggressive than the last:
//!
//! - **clean** collapses connectives (`&`, `and`, `/`, commas) and folds
//!   "-ing"/"-in'" endings to "-in".
//! - **simple** strips articles, `!`, bracketed or parenthesised extras and
//!   version suffixes such as " - radio edit".
//! - **complex** strips subtitles after a colon and quoted nicknames.
//!
//! The tiers are ordered lists so that every run rewrites text the same way.

use std::sync::LazyLock;

use regex::Regex;

use crate::{types::LocalTrack, utils};

/// One regex rewrite inside a tier.
pub struct Replacement {
    pattern: Regex,
    with: &'static str,
}

impl Replacement {
    fn new(pattern: &str, with: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("normalization pattern must compile"),
            with,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, self.with).into_owned()
    }
}

pub static CLEAN_TIER: LazyLock<Vec<Replacement>> = LazyLock::new(|| {
    vec![
        Replacement::new(r"(^|\s+)&\s+", "${1}"),
        Replacement::new(r",(\s+)", "${1}"),
        Replacement::new(r"(^|\s+)and\s+", "${1}"),
        Replacement::new(r"(^|\s+)(/|\\)\s+", "${1}"),
        Replacement::new(r"(\w+)ing(\s|$)", "${1}in${2}"),
        Replacement::new(r"(\w+)in'(\s|$)", "${1}in${2}"),
    ]
});

pub static SIMPLE_TIER: LazyLock<Vec<Replacement>> = LazyLock::new(|| {
    vec![
        Replacement::new(r"\s+the\s+", " "),
        Replacement::new(r"\s*(vs\.?|versus)\s*$", " "),
        Replacement::new(r"[!]", ""),
        Replacement::new(r"(^|\s+)the(\s+|$)", ""),
        Replacement::new(r"\s*\(.*\)", ""),
        Replacement::new(r"\s*\[.*\]", ""),
        Replacement::new(r" - (\w+ )?from .*$", ""),
        Replacement::new(r" - single version.*$", ""),
        Replacement::new(r" - radio edit.*$", ""),
    ]
});

pub static COMPLEX_TIER: LazyLock<Vec<Replacement>> = LazyLock::new(|| {
    vec![
        Replacement::new(r":\s+.*$", ""),
        Replacement::new(r#"["'].*["']\s*"#, ""),
    ]
});

static FEATURING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\s\(\[](?:feat\.?|ft\.?|featuring)\s([\s\w,&]*)[\)\]]?")
        .expect("featuring pattern must compile")
});

/// Runs every rewrite of a tier over `text`, in order.
pub fn apply_tier(tier: &[Replacement], text: &str) -> String {
    tier.iter()
        .fold(text.to_string(), |acc, replacement| replacement.apply(&acc))
}

/// Moves featured artists out of the title and artist fields.
///
/// "Song (feat. Someone)" by "Band" becomes "Song" by "Band & Someone", which
/// is how the catalog usually credits the same recording.
pub fn extract_featured_artists(track: &LocalTrack) -> LocalTrack {
    let mut rewritten = track.clone();

    while let Some(caps) = FEATURING.captures(&rewritten.name) {
        let whole = caps[0].to_string();
        let featured = caps[1].trim().to_string();
        rewritten.name = rewritten.name.replacen(&whole, "", 1);
        rewritten.artist.push_str(" & ");
        rewritten.artist.push_str(&featured);
    }

    while let Some(caps) = FEATURING.captures(&rewritten.artist) {
        let whole = caps[0].to_string();
        let featured = caps[1].trim().to_string();
        rewritten.artist = rewritten.artist.replacen(&whole, "", 1);
        rewritten.artist.push_str(" & ");
        rewritten.artist.push_str(&featured);
    }

    rewritten.name = rewritten.name.trim().to_string();
    rewritten.artist = rewritten.artist.trim().to_string();
    rewritten
}

/// Title, artist and album of a track at one normalization tier.
struct Fields {
    name: String,
    artist: String,
    album: String,
}

impl Fields {
    fn rewrite(&self, tier: &[Replacement]) -> Fields {
        Fields {
            name: apply_tier(tier, &self.name),
            artist: apply_tier(tier, &self.artist),
            album: apply_tier(tier, &self.album),
        }
    }

    fn title_and_artist_queries(&self) -> [String; 4] {
        [
            format!(r#""{}""#, self.name),
            format!(r#""{}" "{}""#, self.name, self.artist),
            format!(r#"track:"{}""#, self.name),
            format!(r#"track:"{}" artist:"{}""#, self.name, self.artist),
        ]
    }

    fn scoped_with_album(&self) -> String {
        format!(
            r#"track:"{}" artist:"{}" album:"{}""#,
            self.name, self.artist, self.album
        )
    }

    fn quoted_with_album(&self) -> String {
        format!(r#""{}" "{}" "{}""#, self.name, self.artist, self.album)
    }
}

/// Builds the ordered list of search queries to try for a track, from the
/// most specific to the most forgiving. Duplicates are dropped, keeping the
/// first occurrence.
pub fn search_attempts(track: &LocalTrack) -> Vec<String> {
    let raw = Fields {
        name: track.name.to_lowercase(),
        artist: track.artist.to_lowercase(),
        album: track.album.to_lowercase(),
    };
    let clean = raw.rewrite(&CLEAN_TIER);
    let simple = clean.rewrite(&SIMPLE_TIER);

    let mut queries: Vec<String> = Vec::new();
    for fields in [&raw, &clean, &simple] {
        queries.extend(fields.title_and_artist_queries());
    }
    for fields in [&raw, &clean, &simple] {
        queries.push(fields.scoped_with_album());
    }
    for fields in [&raw, &clean, &simple] {
        queries.push(fields.quoted_with_album());
    }

    utils::dedupe_preserving_order(queries)
}
