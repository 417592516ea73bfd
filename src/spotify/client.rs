use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::{
    catalog::{CatalogClient, CatalogError, SEARCH_PAGE_SIZE},
    config,
    management::TokenManager,
    types::{
        AddTracksToPlaylistRequest, AlbumObject, CatalogAlbum, CatalogPlaylist, CatalogTrack,
        CatalogUser, CreatePlaylistRequest, Paging, PlaylistObject, SaveTracksRequest,
        SearchResponse, SeveralTracksResponse, SimplifiedTrackObject, TrackObject, UserObject,
    },
};

/// [`CatalogClient`] backed by the Spotify Web API.
///
/// Each trait call issues exactly one logical request so that a rate-limited
/// call can be repeated as-is. Callers keep id lists within
/// [`crate::catalog::MAX_IDS_PER_REQUEST`] and
/// [`crate::catalog::MAX_URIS_PER_REQUEST`].
pub struct SpotifyClient {
    http: Client,
    base_url: String,
    tokens: Mutex<TokenManager>,
}

impl SpotifyClient {
    pub fn new(tokens: TokenManager) -> Self {
        Self {
            http: Client::new(),
            base_url: config::spotify_apiurl(),
            tokens: Mutex::new(tokens),
        }
    }

    /// Builds a client from the token saved by `tunematch auth`.
    pub async fn from_saved_token() -> Result<Self, String> {
        let tokens = TokenManager::load().await?;
        Ok(Self::new(tokens))
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.tokens.lock().await.get_valid_token().await;
        request.bearer_auth(token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, CatalogError> {
        let response = self.authorized(request).await.send().await?;
        check(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let response = self.send(self.http.get(url)).await?;
        Ok(response.json::<T>().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Maps non-success responses onto [`CatalogError`].
async fn check(response: Response) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(CatalogError::RateLimited { retry_after });
    }

    let message = response.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED {
        return Err(CatalogError::Auth(format!(
            "{} (run tunematch auth again)",
            message
        )));
    }

    Err(CatalogError::Status {
        status: status.as_u16(),
        message,
    })
}

fn track_uri(id: &str) -> String {
    format!("spotify:track:{}", id)
}

#[async_trait]
impl CatalogClient for SpotifyClient {
    async fn search_tracks(
        &self,
        query: &str,
        max_pages: u32,
    ) -> Result<Vec<CatalogTrack>, CatalogError> {
        let mut tracks = Vec::new();

        for page in 0..max_pages {
            let request = self.http.get(self.url("/search")).query(&[
                ("q", query.to_string()),
                ("type", "track".to_string()),
                ("limit", SEARCH_PAGE_SIZE.to_string()),
                ("offset", (page * SEARCH_PAGE_SIZE).to_string()),
            ]);
            let response: SearchResponse = self.send(request).await?.json().await?;

            let last_page = response.tracks.next.is_none();
            tracks.extend(
                response
                    .tracks
                    .items
                    .into_iter()
                    .filter_map(TrackObject::into_catalog),
            );
            if last_page {
                break;
            }
        }

        Ok(tracks)
    }

    async fn get_track(&self, id: &str) -> Result<CatalogTrack, CatalogError> {
        let track: TrackObject = self.get_json(&self.url(&format!("/tracks/{}", id))).await?;
        track.into_catalog().ok_or_else(|| CatalogError::Status {
            status: 404,
            message: format!("track {} is not playable from the catalog", id),
        })
    }

    async fn get_album(&self, id: &str) -> Result<CatalogAlbum, CatalogError> {
        let mut album: AlbumObject = self.get_json(&self.url(&format!("/albums/{}", id))).await?;

        // long albums page their track list
        let mut next = album.tracks.next.take();
        while let Some(url) = next {
            let mut page: Paging<SimplifiedTrackObject> = self.get_json(&url).await?;
            album.tracks.items.append(&mut page.items);
            next = page.next;
        }

        Ok(CatalogAlbum::from(album))
    }

    async fn get_tracks(&self, ids: &[String]) -> Result<Vec<CatalogTrack>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .http
            .get(self.url("/tracks"))
            .query(&[("ids", ids.join(","))]);
        let response: SeveralTracksResponse = self.send(request).await?.json().await?;

        Ok(response
            .tracks
            .into_iter()
            .flatten()
            .filter_map(TrackObject::into_catalog)
            .collect())
    }

    async fn add_tracks_to_library(&self, ids: &[String]) -> Result<(), CatalogError> {
        let body = SaveTracksRequest { ids: ids.to_vec() };
        self.send(self.http.put(self.url("/me/tracks")).json(&body))
            .await?;
        Ok(())
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
    ) -> Result<CatalogPlaylist, CatalogError> {
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: "Imported from iTunes by tunematch".to_string(),
            public,
        };
        let request = self
            .http
            .post(self.url(&format!("/users/{}/playlists", user_id)))
            .json(&body);
        let playlist: PlaylistObject = self.send(request).await?.json().await?;

        Ok(CatalogPlaylist {
            id: playlist.id,
            name: playlist.name,
        })
    }

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        ids: &[String],
    ) -> Result<(), CatalogError> {
        let body = AddTracksToPlaylistRequest {
            uris: ids.iter().map(|id| track_uri(id)).collect(),
        };
        let request = self
            .http
            .post(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .json(&body);
        self.send(request).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<CatalogUser, CatalogError> {
        let user: UserObject = self.get_json(&self.url("/me")).await?;
        Ok(CatalogUser {
            id: user.id,
            display_name: user.display_name,
        })
    }
}
