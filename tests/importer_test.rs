mod common;

use std::{
    path::Path,
    sync::{Arc, atomic::Ordering},
};

use common::*;
use tunematch::{
    catalog::CatalogClient,
    importer::{ImportError, ImportOptions, Importer, LIBRARY_PLAYLIST_NAME},
    library::{Library, LibraryPlaylist},
    management::{MatchCache, cache_path_for},
    matching::{Resolver, Selection},
    retry::RetryPolicy,
    types::LocalTrack,
};

async fn importer_for<'a>(
    library: &'a Library,
    catalog: &Arc<FakeCatalog>,
    disambiguator: ScriptedDisambiguator,
    options: ImportOptions,
) -> Importer<'a> {
    let client: Arc<dyn CatalogClient> = catalog.clone();
    let resolver = Resolver::new(
        Arc::clone(&client),
        MatchCache::load(library.path()).await,
        Box::new(disambiguator),
        options.resolver_options(),
    )
    .with_retry(RetryPolicy::immediate());

    Importer::new(library, client, resolver, options).with_retry(RetryPolicy::immediate())
}

fn small_library(dir: &Path) -> Library {
    let podcast = LocalTrack {
        podcast: true,
        ..local_track(2, "Episode 1", "Host", "Show")
    };
    let tracks = vec![
        local_track(1, "Yesterday", "The Beatles", "Help!"),
        podcast,
        local_track(3, "Unknown Song", "Nobody", "Demos"),
    ];
    let playlists = vec![
        LibraryPlaylist {
            name: "Library".to_string(),
            master: true,
            track_ids: vec![1, 2, 3],
            ..Default::default()
        },
        LibraryPlaylist {
            name: "Podcasts".to_string(),
            podcasts: true,
            track_ids: vec![2],
            ..Default::default()
        },
        LibraryPlaylist {
            name: "Road Trip".to_string(),
            track_ids: vec![1, 3],
            ..Default::default()
        },
    ];
    Library::new(dir.join("Library.xml"), tracks, playlists)
}

#[tokio::test]
async fn test_import_creates_playlists_and_logs_missing_tracks() {
    let dir = tempfile::tempdir().unwrap();
    let library = small_library(dir.path());
    let catalog = Arc::new(FakeCatalog::default().with_search(r#""yesterday""#, vec![yesterday()]));
    let script = ScriptedDisambiguator::new(vec![Selection::NoneOfTheAbove]);
    let asked = script.asked();

    let mut importer =
        importer_for(&library, &catalog, script, ImportOptions::default()).await;
    let summary = importer.run().await.unwrap();

    assert_eq!(summary.playlists_created, 2);
    assert_eq!(summary.saved_to_library, 0);
    assert_eq!(summary.missing, 3);

    let playlists = catalog.playlists.lock().unwrap().clone();
    assert_eq!(
        playlists,
        vec![
            (LIBRARY_PLAYLIST_NAME.to_string(), vec!["sp1".to_string()]),
            ("Road Trip".to_string(), vec!["sp1".to_string()]),
        ]
    );
    assert!(catalog.saved.lock().unwrap().is_empty());

    // The unknown song is asked about once and remembered for the playlist.
    assert_eq!(asked.load(Ordering::SeqCst), 1);

    let missing = importer.missing();
    assert_eq!(
        missing.entries(LIBRARY_PLAYLIST_NAME),
        ["Episode 1 (Host)[Show]", "Unknown Song (Nobody)[Demos]"]
    );
    assert_eq!(missing.entries("Road Trip"), ["Unknown Song (Nobody)[Demos]"]);
    assert!(missing.path().exists());
    assert!(cache_path_for(library.path()).exists());
}

#[tokio::test]
async fn test_import_playlists_only_skips_library_tracks() {
    let dir = tempfile::tempdir().unwrap();
    let library = small_library(dir.path());
    let catalog = Arc::new(FakeCatalog::default().with_search(r#""yesterday""#, vec![yesterday()]));
    let options = ImportOptions {
        library_as_playlist: false,
        ..Default::default()
    };

    let mut importer =
        importer_for(&library, &catalog, ScriptedDisambiguator::new(vec![]), options).await;
    let summary = importer.run().await.unwrap();

    assert_eq!(summary.playlists_created, 1);
    assert_eq!(summary.missing, 1);
    assert_eq!(catalog.count("create_playlist:"), 1);
    assert_eq!(catalog.count("create_playlist:Road Trip"), 1);
    assert!(importer.missing().entries(LIBRARY_PLAYLIST_NAME).is_empty());
}

#[tokio::test]
async fn test_write_back_is_chunked() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = FakeCatalog::default();
    let mut tracks = Vec::new();
    for n in 0..120 {
        let name = format!("Song {:03}", n);
        tracks.push(local_track(n, &name, "Band", ""));
        catalog = catalog.with_search(
            &format!(r#""{}""#, name.to_lowercase()),
            vec![catalog_track(
                &format!("sp{:03}", n),
                &name,
                "Band",
                "Collection",
                "alb1",
                70,
            )],
        );
    }
    let library = Library::new(dir.path().join("Library.xml"), tracks, Vec::new());
    let catalog = Arc::new(catalog);
    let options = ImportOptions {
        add_to_library: true,
        ..Default::default()
    };

    let mut importer =
        importer_for(&library, &catalog, ScriptedDisambiguator::new(vec![]), options).await;
    let summary = importer.run().await.unwrap();

    assert_eq!(summary.saved_to_library, 120);
    assert_eq!(summary.missing, 0);
    assert_eq!(catalog.count("save:50"), 2);
    assert_eq!(catalog.count("save:20"), 1);
    assert_eq!(catalog.count("add_to_playlist:"), 2);

    let playlists = catalog.playlists.lock().unwrap();
    assert_eq!(playlists[0].1.len(), 120);
    assert_eq!(playlists[0].1[0], "sp000");
    assert_eq!(playlists[0].1[119], "sp119");
}

#[tokio::test]
async fn test_unknown_user_aborts_import() {
    let dir = tempfile::tempdir().unwrap();
    let library = small_library(dir.path());
    let catalog = Arc::new(FakeCatalog {
        user_fails: true,
        ..Default::default()
    });

    let mut importer = importer_for(
        &library,
        &catalog,
        ScriptedDisambiguator::new(vec![]),
        ImportOptions::default(),
    )
    .await;
    let result = importer.run().await;

    assert!(matches!(result, Err(ImportError::CurrentUser(_))));
    assert_eq!(catalog.count("search:"), 0);
    assert_eq!(catalog.count("create_playlist:"), 0);
}
