use crate::api::{
    self, AddFromDbRequest, AddFromDbStatus, AddToListRequest, CommentRequest, OptionsRequest,
    RatingRequest, RecordOrder, RecordsOrderRequest, SearchKind, SearchOptions, SearchResponse,
};
use crate::auth::{self, TokenPair, TOKEN_PATH, TOKEN_REFRESH_PATH};
use crate::dedup::RequestDeduplicator;
use crate::error::ApiError;
use crate::traits::RecordsBackend;
use async_trait::async_trait;
use movielist_config::ApiConfig;
use movielist_models::{ListId, Record, RecordOptions};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Deduplication key shared by every request that needs a new access token.
const REFRESH_KEY: &str = "token-refresh";

/// REST client for the movie list backend.
///
/// Attaches the bearer token to every call. A 401 triggers one shared token
/// refresh (concurrent failures wait on the same refresh) and the original
/// request is retried exactly once.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    tokens: Arc<RwLock<Option<TokenPair>>>,
    refresher: RequestDeduplicator<String, ApiError>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| ApiError::Unknown(format!("invalid base URL {}: {}", normalized, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("movielist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Unknown(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            tokens: Arc::new(RwLock::new(None)),
            refresher: RequestDeduplicator::new(),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub async fn set_tokens(&self, tokens: Option<TokenPair>) {
        *self.tokens.write().await = tokens;
    }

    /// Current session tokens, including any obtained by a refresh.
    pub async fn tokens(&self) -> Option<TokenPair> {
        self.tokens.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Unknown(format!("invalid endpoint {}: {}", path, e)))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        let url = self.endpoint(TOKEN_PATH)?;
        let tokens = auth::obtain_tokens(&self.client, url, username, password).await?;
        *self.tokens.write().await = Some(tokens.clone());
        info!("Logged in as {}", username);
        Ok(tokens)
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Concurrent callers share a single refresh request. On failure the
    /// session is dropped and an authentication error is returned.
    pub async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let client = self.client.clone();
        let url = self.endpoint(TOKEN_REFRESH_PATH)?;
        let tokens = Arc::clone(&self.tokens);

        self.refresher
            .run(REFRESH_KEY, move || async move {
                let refresh_token = tokens
                    .read()
                    .await
                    .as_ref()
                    .map(|pair| pair.refresh.clone())
                    .ok_or_else(|| ApiError::Authentication("no refresh token available".to_string()))?;

                match auth::refresh_tokens(&client, url, &refresh_token).await {
                    Ok(pair) => {
                        let access = pair.access.clone();
                        *tokens.write().await = Some(pair);
                        info!("Access token refreshed");
                        Ok(access)
                    }
                    Err(e) => {
                        warn!("Token refresh failed, dropping session: {}", e);
                        *tokens.write().await = None;
                        Err(ApiError::Authentication(format!("session expired: {}", e)))
                    }
                }
            })
            .await
    }

    async fn access_token(&self) -> Option<String> {
        self.tokens.read().await.as_ref().map(|pair| pair.access.clone())
    }

    async fn execute<F>(&self, build: &F, token: Option<&str>) -> Result<Response, ApiError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut request = build(&self.client);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    /// Send an authorized request, refreshing the token and retrying once on 401.
    async fn send<F>(&self, build: F) -> Result<Response, ApiError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let used_token = self.access_token().await;
        let response = self.execute(&build, used_token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check(response).await;
        }

        let Some(used_token) = used_token else {
            return Self::check(response).await;
        };
        drop(response);

        let fresh_token = match self.access_token().await {
            Some(current) if current != used_token => {
                debug!("Token already refreshed by a concurrent request, retrying");
                current
            }
            _ => self.refresh_access_token().await?,
        };

        let retry = self.execute(&build, Some(&fresh_token)).await?;
        Self::check(retry).await
    }

    pub async fn search(
        &self,
        query: &str,
        kind: SearchKind,
        options: &SearchOptions,
    ) -> Result<SearchResponse, ApiError> {
        let url = self.endpoint("search/")?;
        let options_json = serde_json::to_string(options)
            .map_err(|e| ApiError::Unknown(format!("failed to encode search options: {}", e)))?;
        let kind = match kind {
            SearchKind::Movie => "movie",
            SearchKind::Person => "person",
        };

        let response = self
            .send(|client| {
                client
                    .get(url.clone())
                    .query(&[("query", query), ("type", kind), ("options", options_json.as_str())])
            })
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl RecordsBackend for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_records(&self) -> Result<Vec<Record>, ApiError> {
        let url = self.endpoint("records/")?;
        let response = self.send(|client| client.get(url.clone())).await?;
        let values: Vec<serde_json::Value> = response.json().await?;
        Ok(api::decode_records(values))
    }

    #[instrument(skip(self))]
    async fn fetch_user_records(&self, username: &str) -> Result<Vec<Record>, ApiError> {
        let url = self.endpoint(&api::user_records_path(username))?;
        let response = self.send(|client| client.get(url.clone())).await?;
        let values: Vec<serde_json::Value> = response.json().await?;
        Ok(api::decode_records(values))
    }

    async fn add_to_list(&self, movie_id: i64, list_id: ListId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("add-to-list/{}/", movie_id))?;
        let body = AddToListRequest { list_id };
        self.send(|client| client.post(url.clone()).json(&body)).await?;
        Ok(())
    }

    async fn add_to_list_from_db(&self, movie_id: i64, list_id: ListId) -> Result<AddFromDbStatus, ApiError> {
        let url = self.endpoint("add-to-list-from-db/")?;
        let body = AddFromDbRequest { movie_id, list_id };
        let response = self.send(|client| client.post(url.clone()).json(&body)).await?;
        let text = response.text().await?;
        Ok(api::decode_add_from_db_status(&text))
    }

    async fn remove_record(&self, record_id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("remove-record/{}/", record_id))?;
        self.send(|client| client.delete(url.clone())).await?;
        Ok(())
    }

    async fn change_rating(&self, record_id: i64, rating: u8) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("change-rating/{}/", record_id))?;
        let body = RatingRequest { rating };
        self.send(|client| client.put(url.clone()).json(&body)).await?;
        Ok(())
    }

    async fn save_options(&self, record_id: i64, options: &RecordOptions) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("record/{}/options/", record_id))?;
        let body = OptionsRequest { options };
        self.send(|client| client.put(url.clone()).json(&body)).await?;
        Ok(())
    }

    async fn save_comment(&self, record_id: i64, comment: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("save-comment/{}/", record_id))?;
        let body = CommentRequest { comment };
        self.send(|client| client.put(url.clone()).json(&body)).await?;
        Ok(())
    }

    async fn save_records_order(&self, records: &[RecordOrder]) -> Result<(), ApiError> {
        let url = self.endpoint("save-records-order/")?;
        let body = RecordsOrderRequest { records };
        self.send(|client| client.put(url.clone()).json(&body)).await?;
        Ok(())
    }
}
