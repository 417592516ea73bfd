use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub token: Option<Token>,
}

/// A track as it appears in the local library export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalTrack {
    pub id: i64,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub disabled: bool,
    pub podcast: bool,
    pub video: bool,
    pub audiobook: bool,
    pub tv_show: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub name: String,
    pub album_type: String,
}

/// A track returned by the remote catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    pub album: AlbumRef,
    pub popularity: u32,
}

impl CatalogTrack {
    /// All credited artist names joined into one comparable string.
    pub fn artist(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumTrackRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogAlbum {
    pub id: String,
    pub name: String,
    pub album_type: String,
    pub tracks: Vec<AlbumTrackRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogUser {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPlaylist {
    pub id: String,
    pub name: String,
}

// Wire types of the Spotify Web API.

#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistObject {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimplifiedAlbumObject {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub album_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    pub id: Option<String>,
    pub uri: String,
    pub name: String,
    pub artists: Vec<ArtistObject>,
    pub album: SimplifiedAlbumObject,
    #[serde(default)]
    pub popularity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimplifiedTrackObject {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumObject {
    pub id: String,
    pub name: String,
    pub album_type: String,
    pub tracks: Paging<SimplifiedTrackObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: Paging<TrackObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeveralTracksResponse {
    pub tracks: Vec<Option<TrackObject>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserObject {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistObject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddTracksToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveTracksRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    pub expires_in: u64,
}

impl TrackObject {
    /// Converts a wire track into a catalog track. Local files carry no id and
    /// cannot be matched, so they yield `None`.
    pub fn into_catalog(self) -> Option<CatalogTrack> {
        let id = self.id?;
        Some(CatalogTrack {
            id,
            uri: self.uri,
            name: self.name,
            artists: self
                .artists
                .into_iter()
                .map(|a| ArtistRef {
                    id: a.id.unwrap_or_default(),
                    name: a.name,
                })
                .collect(),
            album: AlbumRef {
                id: self.album.id.unwrap_or_default(),
                name: self.album.name,
                album_type: self.album.album_type.unwrap_or_default(),
            },
            popularity: self.popularity,
        })
    }
}

impl From<AlbumObject> for CatalogAlbum {
    fn from(album: AlbumObject) -> Self {
        CatalogAlbum {
            id: album.id,
            name: album.name,
            album_type: album.album_type,
            tracks: album
                .tracks
                .items
                .into_iter()
                .filter_map(|t| {
                    t.id.map(|id| AlbumTrackRef {
                        id,
                        name: t.name,
                    })
                })
                .collect(),
        }
    }
}

#[derive(Tabled)]
pub struct MatchTableRow {
    pub id: i64,
    pub local: String,
    pub catalog: String,
    pub score: String,
}
