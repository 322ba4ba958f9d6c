//! Lichess API client struct and builder.

use futures::{Stream, StreamExt, TryStreamExt};
use lichess_auth::AuthToken;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{LichessError, map_http_status, map_reqwest_error, retry_after};
use crate::types::{Account, BroadcastRecord, ImportedGame, Study, StudyRecord};

/// Characters escaped in a URL path segment. Lichess ids and usernames are
/// alphanumeric plus `-` and `_`, so this only matters for hostile input.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const NDJSON_MIME: &str = "application/x-ndjson";

/// Client for the Lichess API, bound to one access token.
///
/// Cheap to clone: clones share the connection pool.
///
/// # Example
///
/// ```no_run
/// use lichess_auth::AuthToken;
/// use lichess_client::Lichess;
///
/// let client = Lichess::new(AuthToken::new("lip_xxx"))
///     .base_url("http://localhost:9663");
/// ```
#[derive(Debug, Clone)]
pub struct Lichess {
    /// API base URL, without trailing slash.
    pub(crate) base_url: String,
    /// Timeout for non-streaming requests.
    pub(crate) timeout: Option<Duration>,
    /// `User-Agent` header value.
    pub(crate) user_agent: String,
    /// Bearer token sent with every request.
    token: AuthToken,
    /// Shared HTTP client.
    client: reqwest::Client,
}

impl Lichess {
    /// Create a client for lichess.org with default settings.
    #[must_use]
    pub fn new(token: AuthToken) -> Self {
        Self::from_config(ClientConfig::default(), token)
    }

    /// Create a client from explicit configuration.
    #[must_use]
    pub fn from_config(config: ClientConfig, token: AuthToken) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            user_agent: config.user_agent,
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL.
    ///
    /// Useful for testing with a mock server or a local Lichess instance.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the timeout for non-streaming requests.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Reuse an existing `reqwest` client (connection pool, proxy settings).
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The token this client sends.
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Fetch the authenticated user's account.
    pub async fn account(&self) -> Result<Account, LichessError> {
        let request = self.request(Method::GET, "/api/account")?;
        let response = self.send(request).await?;
        decode_json(response).await
    }

    /// List the studies of `username` visible to this token.
    pub async fn studies_by(&self, username: &str) -> Result<Vec<Study>, LichessError> {
        self.study_stream(username).await?.try_collect().await
    }

    /// Stream the studies of `username` as Lichess sends them.
    pub async fn study_stream(
        &self,
        username: &str,
    ) -> Result<impl Stream<Item = Result<Study, LichessError>> + Send + 'static, LichessError> {
        let path = format!("/api/study/by/{}", encode_segment(username));
        self.ndjson_list::<StudyRecord>(&path).await
    }

    /// List the broadcast rounds this token can push to.
    pub async fn my_broadcast_rounds(&self) -> Result<Vec<Study>, LichessError> {
        self.broadcast_round_stream().await?.try_collect().await
    }

    /// Stream the broadcast rounds this token can push to.
    pub async fn broadcast_round_stream(
        &self,
    ) -> Result<impl Stream<Item = Result<Study, LichessError>> + Send + 'static, LichessError> {
        self.ndjson_list::<BroadcastRecord>("/api/broadcast/my-rounds")
            .await
    }

    /// Import a PGN as a new game.
    pub async fn import_pgn(&self, pgn: &str) -> Result<ImportedGame, LichessError> {
        let request = self
            .request(Method::POST, "/api/import")?
            .form(&[("pgn", pgn)]);
        let response = self.send(request).await?;
        decode_json(response).await
    }

    /// Import a PGN into an existing study as chapter(s) named `name`.
    pub async fn import_pgn_to_study(
        &self,
        study_id: &str,
        pgn: &str,
        name: &str,
    ) -> Result<(), LichessError> {
        let path = format!("/api/study/{}/import-pgn", encode_segment(study_id));
        let request = self
            .request(Method::POST, &path)?
            .form(&[("pgn", pgn), ("name", name)]);
        self.send(request).await?;
        Ok(())
    }

    /// Push PGN games to a broadcast round.
    pub async fn push_round(&self, round_id: &str, pgn: &str) -> Result<(), LichessError> {
        let path = format!("/api/broadcast/round/{}/push", encode_segment(round_id));
        let request = self
            .request(Method::POST, &path)?
            .header(CONTENT_TYPE, "text/plain")
            .body(pgn.to_string());
        self.send(request).await?;
        Ok(())
    }

    /// Open an NDJSON listing whose lines have shape `R`.
    ///
    /// Studies and broadcast rounds differ only in `R`.
    async fn ndjson_list<R>(
        &self,
        path: &str,
    ) -> Result<
        impl Stream<Item = Result<Study, LichessError>> + Send + 'static + use<R>,
        LichessError,
    >
    where
        R: DeserializeOwned + Into<Study> + Send + 'static,
    {
        let url = self.url(path);
        tracing::debug!(url = %url, "opening NDJSON listing");
        let request = self
            .authorize(self.client.get(&url))?
            .header(ACCEPT, NDJSON_MIME);
        let response = self.send(request).await?;

        let records = lichess_ndjson::records::<R, _, _>(response.bytes_stream());
        Ok(records.map(|record| {
            record
                .map(<R as Into<Study>>::into)
                .map_err(LichessError::from)
        }))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// An authorized request with the configured timeout.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, LichessError> {
        let url = self.url(path);
        tracing::debug!(method = %method, url = %url, "sending request to Lichess");
        let mut request = self.client.request(method, &url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        self.authorize(request)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, LichessError> {
        let mut bearer = self
            .token
            .with_secret(|t| HeaderValue::from_str(&format!("Bearer {t}")))
            .map_err(|_| {
                LichessError::InvalidConfig(
                    "token contains characters not allowed in a header".into(),
                )
            })?;
        bearer.set_sensitive(true);
        Ok(request
            .header(AUTHORIZATION, bearer)
            .header(USER_AGENT, self.user_agent.as_str()))
    }

    /// Send and turn non-success statuses into errors.
    async fn send(&self, request: RequestBuilder) -> Result<Response, LichessError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let wait = retry_after(response.headers());
        let body = response.text().await.map_err(map_reqwest_error)?;
        tracing::warn!(status = %status, "Lichess request failed");
        Err(map_http_status(status, wait, &body))
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, LichessError> {
    let text = response.text().await.map_err(map_reqwest_error)?;
    serde_json::from_str(&text)
        .map_err(|e| LichessError::Decode(format!("invalid JSON response: {e}")))
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}
