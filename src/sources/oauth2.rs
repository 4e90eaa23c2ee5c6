use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::settings::CdekConfig;
use crate::error::AuthError;
use crate::sources::fetch::FetchToken;

/// OAuth2 client-credentials issuer.
#[derive(Clone)]
pub struct OAuth2Source {
    pub url: String,
    client_id: String,
    client_secret: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

impl OAuth2Source {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            client,
        }
    }

    pub fn from_settings(client: &Client, cfg: &CdekConfig) -> Self {
        Self::new(
            client.clone(),
            cfg.oauth_url.as_str(),
            cfg.client_id.clone().unwrap_or_default(),
            cfg.client_secret.clone().unwrap_or_default(),
        )
    }
}

impl FetchToken for OAuth2Source {
    async fn fetch_token(&self) -> Result<String, AuthError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        debug!("requesting access token from {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!("token endpoint answered {}", status);
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        parsed
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::MalformedResponse("access_token is absent".to_owned()))
    }
}
