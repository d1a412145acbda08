use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub(crate) const TOKEN_PATH: &str = "token/";
pub(crate) const TOKEN_REFRESH_PATH: &str = "token/refresh/";

/// Access and refresh token of a backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    /// Present when the backend rotates refresh tokens
    #[serde(default)]
    refresh: Option<String>,
}

pub(crate) async fn obtain_tokens(
    client: &Client,
    url: Url,
    username: &str,
    password: &str,
) -> Result<TokenPair, ApiError> {
    let response = client
        .post(url)
        .json(&LoginRequest { username, password })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status, &body));
    }

    Ok(response.json::<TokenPair>().await?)
}

pub(crate) async fn refresh_tokens(
    client: &Client,
    url: Url,
    refresh_token: &str,
) -> Result<TokenPair, ApiError> {
    let response = client
        .post(url)
        .json(&RefreshRequest { refresh: refresh_token })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status, &body));
    }

    let refreshed: RefreshResponse = response.json().await?;
    Ok(TokenPair {
        access: refreshed.access,
        refresh: refreshed.refresh.unwrap_or_else(|| refresh_token.to_string()),
    })
}
