//! Reader for the iTunes `Library.xml` export.
//!
//! The export is an Apple property list: a top-level `<dict>` whose `Tracks`
//! entry maps track ids to track dictionaries, and whose `Playlists` entry is
//! an array of playlist dictionaries. Only the fields matching needs are read.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use roxmltree::{Document, Node, ParsingOptions};
use thiserror::Error;

use crate::types::LocalTrack;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed library XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("unexpected library layout: {0}")]
    Format(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryPlaylist {
    pub name: String,
    pub master: bool,
    pub music: bool,
    pub movies: bool,
    pub tv_shows: bool,
    pub podcasts: bool,
    pub track_ids: Vec<i64>,
}

impl LibraryPlaylist {
    /// Playlists iTunes maintains itself, which are never imported.
    pub fn is_system(&self) -> bool {
        self.master || self.movies || self.tv_shows || self.podcasts
    }
}

#[derive(Debug, Default)]
pub struct Library {
    path: PathBuf,
    tracks: Vec<LocalTrack>,
    by_id: HashMap<i64, usize>,
    playlists: Vec<LibraryPlaylist>,
}

impl Library {
    pub fn new(path: PathBuf, tracks: Vec<LocalTrack>, playlists: Vec<LibraryPlaylist>) -> Self {
        let by_id = tracks
            .iter()
            .enumerate()
            .map(|(index, track)| (track.id, index))
            .collect();

        let mut library = Self {
            path,
            tracks,
            by_id,
            playlists: Vec::new(),
        };
        library.playlists = playlists
            .into_iter()
            .map(|mut playlist| {
                playlist.track_ids.retain(|id| library.by_id.contains_key(id));
                playlist
            })
            .collect();
        library
    }

    pub async fn load(path: &Path) -> Result<Self, LibraryError> {
        let xml = async_fs::read_to_string(path)
            .await
            .map_err(|source| LibraryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let mut library = Self::parse(&xml)?;
        library.path = path.to_path_buf();
        Ok(library)
    }

    pub fn parse(xml: &str) -> Result<Self, LibraryError> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = Document::parse_with_options(xml, options)?;

        let root = elements(doc.root_element())
            .find(|n| n.has_tag_name("dict"))
            .ok_or_else(|| LibraryError::Format("missing top-level <dict>".to_string()))?;

        let tracks = match dict_get(root, "Tracks") {
            Some(dict) => parse_tracks(dict)?,
            None => Vec::new(),
        };

        let playlists = match dict_get(root, "Playlists") {
            Some(array) => elements(array)
                .filter(|n| n.has_tag_name("dict"))
                .map(parse_playlist)
                .collect(),
            None => Vec::new(),
        };

        Ok(Self::new(PathBuf::new(), tracks, playlists))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tracks in the order the export lists them.
    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn track(&self, id: i64) -> Option<&LocalTrack> {
        self.by_id.get(&id).map(|&index| &self.tracks[index])
    }

    pub fn playlists(&self) -> &[LibraryPlaylist] {
        &self.playlists
    }
}

fn parse_tracks(dict: Node) -> Result<Vec<LocalTrack>, LibraryError> {
    dict_entries(dict)
        .into_iter()
        .filter(|(_, value)| value.has_tag_name("dict"))
        .map(|(key, value)| parse_track(key, value))
        .collect()
}

fn parse_track(key: &str, dict: Node) -> Result<LocalTrack, LibraryError> {
    let id = match integer(dict, "Track ID") {
        Some(id) => id,
        None => key
            .trim()
            .parse()
            .map_err(|_| LibraryError::Format(format!("track {:?} has no Track ID", key)))?,
    };

    let kind = string(dict, "Kind").to_lowercase();

    Ok(LocalTrack {
        id,
        name: string(dict, "Name"),
        artist: string(dict, "Artist"),
        album: string(dict, "Album"),
        disabled: flag(dict, "Disabled"),
        podcast: flag(dict, "Podcast"),
        video: flag(dict, "Movie") || flag(dict, "Has Video"),
        audiobook: flag(dict, "iTunes U") || kind.contains("audiobook"),
        tv_show: flag(dict, "TV Show"),
    })
}

fn parse_playlist(dict: Node) -> LibraryPlaylist {
    let track_ids = dict_get(dict, "Playlist Items")
        .map(|array| {
            elements(array)
                .filter(|n| n.has_tag_name("dict"))
                .filter_map(|item| integer(item, "Track ID"))
                .collect()
        })
        .unwrap_or_default();

    LibraryPlaylist {
        name: string(dict, "Name"),
        master: flag(dict, "Master"),
        music: flag(dict, "Music"),
        movies: flag(dict, "Movies"),
        tv_shows: flag(dict, "TV Shows"),
        podcasts: flag(dict, "Podcasts"),
        track_ids,
    }
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

/// Pairs every `<key>` of a plist `<dict>` with the element that follows it.
fn dict_entries<'a, 'input>(dict: Node<'a, 'input>) -> Vec<(&'a str, Node<'a, 'input>)> {
    let mut entries = Vec::new();
    let mut children = elements(dict);
    while let Some(key) = children.next() {
        if !key.has_tag_name("key") {
            continue;
        }
        if let Some(value) = children.next() {
            entries.push((key.text().unwrap_or_default(), value));
        }
    }
    entries
}

fn dict_get<'a, 'input>(dict: Node<'a, 'input>, key: &str) -> Option<Node<'a, 'input>> {
    dict_entries(dict)
        .into_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, value)| value)
}

fn string(dict: Node, key: &str) -> String {
    dict_get(dict, key)
        .filter(|n| n.has_tag_name("string"))
        .and_then(|n| n.text())
        .unwrap_or_default()
        .to_string()
}

fn integer(dict: Node, key: &str) -> Option<i64> {
    dict_get(dict, key)
        .filter(|n| n.has_tag_name("integer"))
        .and_then(|n| n.text())
        .and_then(|text| text.trim().parse().ok())
}

fn flag(dict: Node, key: &str) -> bool {
    dict_get(dict, key).is_some_and(|n| n.has_tag_name("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple Computer//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>Major Version</key><integer>1</integer>
	<key>Tracks</key>
	<dict>
		<key>101</key>
		<dict>
			<key>Track ID</key><integer>101</integer>
			<key>Name</key><string>Yesterday</string>
			<key>Artist</key><string>The Beatles</string>
			<key>Album</key><string>Help!</string>
			<key>Kind</key><string>MPEG audio file</string>
		</dict>
		<key>102</key>
		<dict>
			<key>Track ID</key><integer>102</integer>
			<key>Name</key><string>Episode 1</string>
			<key>Artist</key><string>Someone &amp; Friends</string>
			<key>Podcast</key><true/>
			<key>Disabled</key><true/>
		</dict>
		<key>103</key>
		<dict>
			<key>Track ID</key><integer>103</integer>
			<key>Name</key><string>Clip</string>
			<key>Has Video</key><true/>
			<key>Kind</key><string>Audiobook</string>
		</dict>
	</dict>
	<key>Playlists</key>
	<array>
		<dict>
			<key>Name</key><string>Library</string>
			<key>Master</key><true/>
			<key>Playlist Items</key>
			<array>
				<dict><key>Track ID</key><integer>101</integer></dict>
				<dict><key>Track ID</key><integer>102</integer></dict>
			</array>
		</dict>
		<dict>
			<key>Name</key><string>Road Trip</string>
			<key>Playlist Items</key>
			<array>
				<dict><key>Track ID</key><integer>101</integer></dict>
				<dict><key>Track ID</key><integer>999</integer></dict>
			</array>
		</dict>
		<dict>
			<key>Name</key><string>Empty</string>
		</dict>
	</array>
</dict>
</plist>
"#;

    #[test]
    fn parses_tracks_in_order() {
        let library = Library::parse(SAMPLE).unwrap();
        let ids: Vec<i64> = library.tracks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![101, 102, 103]);

        let yesterday = library.track(101).unwrap();
        assert_eq!(yesterday.name, "Yesterday");
        assert_eq!(yesterday.artist, "The Beatles");
        assert_eq!(yesterday.album, "Help!");
        assert!(!yesterday.disabled && !yesterday.podcast && !yesterday.video);
    }

    #[test]
    fn reads_flags_and_entities() {
        let library = Library::parse(SAMPLE).unwrap();

        let episode = library.track(102).unwrap();
        assert!(episode.podcast);
        assert!(episode.disabled);
        assert_eq!(episode.artist, "Someone & Friends");
        assert_eq!(episode.album, "");

        let clip = library.track(103).unwrap();
        assert!(clip.video);
        assert!(clip.audiobook);
    }

    #[test]
    fn playlists_drop_unknown_tracks() {
        let library = Library::parse(SAMPLE).unwrap();
        let playlists = library.playlists();
        assert_eq!(playlists.len(), 3);

        assert!(playlists[0].master);
        assert!(playlists[0].is_system());

        assert_eq!(playlists[1].name, "Road Trip");
        assert_eq!(playlists[1].track_ids, vec![101]);
        assert!(!playlists[1].is_system());

        assert!(playlists[2].track_ids.is_empty());
    }

    #[test]
    fn rejects_malformed_xml() {
        assert!(matches!(
            Library::parse("<plist><dict>"),
            Err(LibraryError::Xml(_))
        ));
        assert!(matches!(
            Library::parse("<plist></plist>"),
            Err(LibraryError::Format(_))
        ));
    }
}
