use std::path::Path;

use crate::{
    cli::{connect, load_library, resolver_for},
    error,
    matching::{ResolverOptions, THRESHOLD_LIKELY, THRESHOLD_MATCHED},
    success, utils, warning,
};

/// How close a match is, judged from its score alone.
fn match_quality(score: f64) -> &'static str {
    if score <= THRESHOLD_MATCHED {
        "close"
    } else if score <= THRESHOLD_LIKELY {
        "likely"
    } else {
        "distant"
    }
}

/// Resolves one library track and prints the answer.
pub async fn match_track(library_path: &Path, track_id: i64, options: ResolverOptions) {
    let library = load_library(library_path).await;
    let Some(track) = library.track(track_id) else {
        error!("Track {} is not in {}", track_id, library_path.display());
    };

    let client = connect().await;
    let mut resolver = resolver_for(library_path, client, options).await;
    let candidate = resolver.resolve(track).await;

    if let Err(e) = resolver.flush_cache().await {
        warning!("Cannot save match cache: {}", e);
    }

    let local = utils::render_local(track);
    if candidate.is_valid() {
        success!(
            "{} => {} ({} match)",
            local,
            candidate.option_label(),
            match_quality(candidate.score)
        );
    } else {
        warning!("{} has no match", local);
    }
}
