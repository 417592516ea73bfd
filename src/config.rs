//! Configuration management for tunematch.
//!
//! Values come from environment variables, which are seeded from a `.env`
//! file in the local data directory:
//! - Linux: `~/.local/share/tunematch/.env`
//! - macOS: `~/Library/Application Support/tunematch/.env`
//! - Windows: `%LOCALAPPDATA%/tunematch/.env`
//!
//! Endpoints fall back to the public Spotify URLs. Credentials have no
//! default and are reported as missing.

use std::{env, path::PathBuf, time::Duration};

const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_SCOPE: &str =
    "user-library-modify playlist-modify-private playlist-modify-public user-read-private";
const DEFAULT_BACKOFF_SECS: u64 = 2;

/// Loads the `.env` file from the local data directory, if there is one.
pub async fn load_env() -> Result<(), String> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("tunematch/.env");
    path
}

fn required(key: &str) -> Result<String, String> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("{} must be set in {}", key, env_path().display()))
}

fn or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Address the OAuth callback server binds to, e.g. `127.0.0.1:8888`.
pub fn server_addr() -> String {
    or_default("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

pub fn spotify_client_id() -> Result<String, String> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// Must match a redirect URI registered for the Spotify application.
pub fn spotify_redirect_uri() -> String {
    or_default(
        "SPOTIFY_API_REDIRECT_URI",
        &format!("http://{}/callback", server_addr()),
    )
}

pub fn spotify_scope() -> String {
    or_default("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE)
}

pub fn spotify_apiauth_url() -> String {
    or_default("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL)
}

pub fn spotify_apiurl() -> String {
    or_default("SPOTIFY_API_URL", DEFAULT_API_URL)
}

pub fn spotify_apitoken_url() -> String {
    or_default("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL)
}

/// Pause between rate-limited attempts when the catalog does not name one.
pub fn rate_limit_backoff() -> Duration {
    let secs = env::var("RATE_LIMIT_BACKOFF_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_BACKOFF_SECS);
    Duration::from_secs(secs)
}
