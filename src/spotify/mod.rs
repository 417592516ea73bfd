//! # Spotify Integration Module
//!
//! The Spotify Web API side of tunematch.
//!
//! - [`auth`] implements the OAuth 2.0 PKCE flow: verifier and challenge,
//!   browser launch, local callback, token exchange and refresh.
//! - [`client`] implements [`crate::catalog::CatalogClient`] over `reqwest`,
//!   mapping HTTP 429 and its `Retry-After` header onto
//!   [`crate::catalog::CatalogError::RateLimited`].
//!
//! ## Endpoints used
//!
//! - `GET /search` - track search, 20 results per page
//! - `GET /tracks/{id}`, `GET /tracks?ids=` - track lookup
//! - `GET /albums/{id}` - album with its track list
//! - `GET /me` - current user
//! - `PUT /me/tracks` - save tracks to the library
//! - `POST /users/{user_id}/playlists` - create a playlist
//! - `POST /playlists/{playlist_id}/tracks` - add tracks to a playlist
//! - `POST /api/token` - token exchange and refresh

pub mod auth;
pub mod client;

pub use client::SpotifyClient;
