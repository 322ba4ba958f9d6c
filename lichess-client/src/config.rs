//! Client configuration.

use std::time::Duration;

use crate::error::LichessError;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("lichess-client/", env!("CARGO_PKG_VERSION"));

/// Default timeout for non-streaming requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Static configuration for a [`Lichess`](crate::Lichess) client.
///
/// The timeout bounds request/response calls only. NDJSON listings stay open
/// as long as the server keeps sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL. Defaults to `https://lichess.org`.
    pub base_url: String,
    /// Timeout for non-streaming requests. `None` disables it.
    pub timeout: Option<Duration>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: lichess_auth::LICHESS_HOST.into(),
            timeout: Some(DEFAULT_TIMEOUT),
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `LICHESS_BASE_URL` and `LICHESS_TIMEOUT_SECS`
    /// (`0` disables the timeout).
    pub fn from_env() -> Result<Self, LichessError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LichessError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup("LICHESS_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url.trim().to_string();
        }
        if let Some(raw) = lookup("LICHESS_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                LichessError::InvalidConfig(format!(
                    "LICHESS_TIMEOUT_SECS is not a number: {raw:?}"
                ))
            })?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(config)
    }
}
