use std::{collections::HashMap, net::SocketAddr, str::FromStr, sync::Arc};

use axum::{Extension, Router, extract::Query, response::Html, routing::get};
use tokio::sync::Mutex;

use crate::{Res, config, spotify, types::PkceToken, warning};

/// Serves the OAuth redirect target until the process ends.
pub async fn start_api_server(state: Arc<Mutex<Option<PkceToken>>>) -> Res<()> {
    let app = Router::new().route("/callback", get(callback).layer(Extension(state)));

    let addr = SocketAddr::from_str(&config::server_addr())?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<PkceToken>>>>,
) -> Html<&'static str> {
    let Some(code) = params.get("code") else {
        if let Some(error) = params.get("error") {
            warning!("Authorization was denied: {}", error);
        }
        return Html("<h4>Missing authorization code.</h4>");
    };

    let mut state = shared_state.lock().await;
    let Some(pkce_state) = state.as_mut() else {
        return Html("<h4>Missing PKCE code verifier.</h4>");
    };

    match spotify::auth::exchange_code_pkce(code, &pkce_state.code_verifier).await {
        Ok(token) => {
            pkce_state.token = Some(token);
            Html("<h2>Authentication successful.</h2><p>You can close this window.</p>")
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            Html("<h4>Login failed.</h4>")
        }
    }
}
