use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::Client;
use tokio::{sync::Mutex, time::Instant};

use crate::{
    Res, config, info,
    management::TokenManager,
    server::start_api_server,
    success,
    types::{PkceToken, Token, TokenResponse},
    utils, warning,
};

/// How long the browser round-trip may take.
const AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the OAuth 2.0 PKCE flow and saves the resulting token.
///
/// A local callback server receives the authorization code; the user grants
/// access in the browser. The verifier never leaves this process except in
/// the final token exchange.
pub async fn auth(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Res<()> {
    let client_id = config::spotify_client_id()?;
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier,
            token: None,
        });
    }

    let server_state = Arc::clone(&shared_state);
    tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    let auth_url = format!(
        "{spotify_auth_url}?client_id={client_id}&response_type=code&redirect_uri={redirect_uri}&code_challenge={code_challenge}&code_challenge_method=S256&scope={scope}",
        spotify_auth_url = config::spotify_apiauth_url(),
        client_id = client_id,
        redirect_uri = config::spotify_redirect_uri(),
        code_challenge = code_challenge,
        scope = config::spotify_scope().replace(' ', "%20"),
    );

    info!("Waiting for authorization in the browser...");
    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_token(shared_state)
        .await
        .ok_or("Authentication failed or timed out")?;

    TokenManager::new(token).persist().await?;
    success!("Authentication successful!");
    Ok(())
}

async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    let start = Instant::now();

    while start.elapsed() < AUTH_TIMEOUT {
        {
            let lock = shared_state.lock().await;
            if let Some(token) = lock.as_ref().and_then(|p| p.token.as_ref()) {
                return Some(token.clone());
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

fn into_token(response: TokenResponse, previous_refresh: Option<&str>) -> Token {
    Token {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .unwrap_or_default(),
        scope: response.scope,
        expires_in: response.expires_in,
        obtained_at: Utc::now().timestamp() as u64,
    }
}

/// Trades a refresh token for a new access token. Spotify may omit a new
/// refresh token, in which case the old one stays valid.
pub async fn refresh_token(refresh_token: &str) -> Result<Token, String> {
    let client_id = config::spotify_client_id()?;
    let response = Client::new()
        .post(config::spotify_apitoken_url())
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id.as_str()),
        ])
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| e.to_string())?;

    let body: TokenResponse = response.json().await.map_err(|e| e.to_string())?;
    Ok(into_token(body, Some(refresh_token)))
}

/// Exchanges the authorization code from the callback for a token.
pub async fn exchange_code_pkce(code: &str, verifier: &str) -> Result<Token, String> {
    let client_id = config::spotify_client_id()?;
    let redirect_uri = config::spotify_redirect_uri();

    let response = Client::new()
        .post(config::spotify_apitoken_url())
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", redirect_uri.as_str()),
        ])
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| e.to_string())?;

    let body: TokenResponse = response.json().await.map_err(|e| e.to_string())?;
    Ok(into_token(body, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new".to_string(),
            refresh_token: None,
            scope: String::new(),
            expires_in: 3600,
        };
        let token = into_token(response, Some("old-refresh"));
        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token, "old-refresh");
    }
}
