use std::path::Path;

use tabled::Table;

use crate::{info, management::MatchCache, types::MatchTableRow};

/// Prints the persistent match cache of a library as a table.
pub async fn list_matches(library_path: &Path, unmatched_only: bool) {
    let cache = MatchCache::load(library_path).await;

    let rows: Vec<MatchTableRow> = cache
        .tracks()
        .filter(|entry| !unmatched_only || entry.is_no_match())
        .map(|entry| MatchTableRow {
            id: entry.local_id,
            local: entry.local_track.clone(),
            catalog: entry.catalog_track.clone(),
            score: format!("{:1.4}", entry.score),
        })
        .collect();

    if rows.is_empty() {
        info!("No cached matches in {}", cache.path().display());
        return;
    }

    let count = rows.len();
    println!("{}", Table::new(rows));
    info!(
        "{} of {} cached tracks, {} cached albums",
        count,
        cache.track_count(),
        cache.album_count()
    );
}
