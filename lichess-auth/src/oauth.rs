//! OAuth2 client parameters for Lichess.
//!
//! Lichess supports the authorization-code flow with PKCE for public clients
//! and does not require client registration: any `client_id` is accepted.
//! These are the values an external PKCE library needs; the flow itself is
//! not run here.

/// Production Lichess host.
pub const LICHESS_HOST: &str = "https://lichess.org";

/// Client identifier sent during authorization.
pub const DEFAULT_CLIENT_ID: &str = "lichess-api-demo";

/// Scopes needed to list and write studies and push broadcast rounds.
pub const DEFAULT_SCOPES: &[&str] = &["study:write", "study:read"];

/// Endpoints and client parameters for the authorization-code + PKCE flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    /// Where the user is sent to grant access (`{host}/oauth`).
    pub authorization_url: String,
    /// Where the authorization code is exchanged (`{host}/api/token`).
    pub token_url: String,
    /// Client identifier.
    pub client_id: String,
    /// Requested scopes.
    pub scopes: Vec<String>,
    /// Where Lichess redirects back to after the user decides.
    pub redirect_url: String,
}

impl OAuthConfig {
    /// Parameters for lichess.org with the default client id and scopes.
    pub fn lichess(redirect_url: impl Into<String>) -> Self {
        Self::for_host(LICHESS_HOST, redirect_url)
    }

    /// Parameters for a Lichess instance at `host` (e.g. a local dev server).
    pub fn for_host(host: &str, redirect_url: impl Into<String>) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            authorization_url: format!("{host}/oauth"),
            token_url: format!("{host}/api/token"),
            client_id: DEFAULT_CLIENT_ID.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect(),
            redirect_url: redirect_url.into(),
        }
    }

    /// Override the client identifier.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Add a scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Scopes joined with spaces, as sent in the `scope` parameter.
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}
