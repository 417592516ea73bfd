use std::path::PathBuf;

use chrono::Utc;

use crate::{spotify, types::Token, warning};

/// Seconds before expiry at which a token is already treated as expired.
const EXPIRY_MARGIN: u64 = 240;

pub struct TokenManager {
    token: Token,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        TokenManager { token }
    }

    pub async fn load() -> Result<Self, String> {
        let path = Self::token_path();
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { token })
    }

    pub async fn persist(&self) -> Result<(), String> {
        let path = Self::token_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(path, json).await.map_err(|e| e.to_string())
    }

    /// Returns an access token, refreshing it first when it is about to expire.
    /// A failed refresh keeps the old token and lets the next request fail.
    pub async fn get_valid_token(&mut self) -> String {
        if self.is_expired() {
            match spotify::auth::refresh_token(&self.token.refresh_token).await {
                Ok(new_token) => {
                    self.token = new_token;
                    if let Err(e) = self.persist().await {
                        warning!("Cannot save refreshed token: {}", e);
                    }
                }
                Err(e) => warning!("Cannot refresh token: {}", e),
            }
        }

        self.token.access_token.clone()
    }

    fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + EXPIRY_MARGIN >= self.token.obtained_at + self.token.expires_in
    }

    fn token_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("tunematch/cache/token.json");
        path
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(obtained_at: u64, expires_in: u64) -> Token {
        Token {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            scope: String::new(),
            expires_in,
            obtained_at,
        }
    }

    #[test]
    fn fresh_token_is_not_expired() {
        let now = Utc::now().timestamp() as u64;
        assert!(!TokenManager::new(token(now, 3600)).is_expired());
    }

    #[test]
    fn token_expires_four_minutes_early() {
        let now = Utc::now().timestamp() as u64;
        assert!(TokenManager::new(token(now, 200)).is_expired());
        assert!(TokenManager::new(token(now - 4000, 3600)).is_expired());
    }
}
