mod common;

use common::*;
use tunematch::{
    management::{MatchCache, MissingLog, cache_path_for},
    matching::MatchCandidate,
};

#[tokio::test]
async fn test_missing_cache_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let library_path = dir.path().join("Library.xml");

    let cache = MatchCache::load(&library_path).await;

    assert_eq!(cache.track_count(), 0);
    assert_eq!(cache.album_count(), 0);
    assert_eq!(cache.path(), cache_path_for(&library_path).as_path());
    assert!(!cache.path().exists());
}

#[tokio::test]
async fn test_cache_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let library_path = dir.path().join("Library.xml");

    let mut cache = MatchCache::load(&library_path).await;
    let local = local_track(1, "Yesterday", "The Beatles", "Help!");
    cache.store_track_match(&MatchCandidate::new(local.clone(), yesterday(), 0.03));
    cache.store_track_match(&MatchCandidate::no_match(local_track(2, "Demo", "Nobody", "")));
    cache.store_album_match("Help!", "Help!", "alb1", 0.03);
    cache.save().await.unwrap();

    let loaded = MatchCache::load(&library_path).await;
    assert_eq!(loaded.track_count(), 2);
    assert_eq!(loaded.album_count(), 1);

    let entry = loaded.get_track_match(1).unwrap();
    assert_eq!(entry.catalog_id, "sp1");
    assert_eq!(entry.local_track, "Yesterday (The Beatles)[Help!]");
    assert_eq!(entry.catalog_track, "Yesterday (The Beatles)[Help!]");
    assert_eq!(entry.score, 0.03);

    assert!(loaded.get_track_match(2).unwrap().is_no_match());
    assert_eq!(loaded.get_album_match("Help!").unwrap().catalog_id, "alb1");
    assert!(loaded.get_album_match("help!").is_none());
}

#[tokio::test]
async fn test_corrupt_cache_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let library_path = dir.path().join("Library.xml");
    std::fs::write(cache_path_for(&library_path), "{ not json").unwrap();

    let cache = MatchCache::load(&library_path).await;

    assert_eq!(cache.track_count(), 0);
    assert_eq!(cache.path(), cache_path_for(&library_path).as_path());
}

#[tokio::test]
async fn test_missing_log_groups_by_destination() {
    let dir = tempfile::tempdir().unwrap();
    let library_path = dir.path().join("Library.xml");

    let mut log = MissingLog::for_library(&library_path);
    log.log("Road Trip", &local_track(1, "Demo", "Nobody", "Tapes"));
    log.log("Road Trip", &local_track(2, "Other", "Nobody", "Tapes"));
    log.log("iTunes Library", &local_track(1, "Demo", "Nobody", "Tapes"));
    log.save().await.unwrap();

    let content = std::fs::read_to_string(log.path()).unwrap();
    let saved: std::collections::BTreeMap<String, Vec<String>> =
        serde_json::from_str(&content).unwrap();

    assert_eq!(log.len(), 3);
    assert_eq!(
        saved["Road Trip"],
        vec!["Demo (Nobody)[Tapes]", "Other (Nobody)[Tapes]"]
    );
    assert_eq!(saved["iTunes Library"].len(), 1);
}
