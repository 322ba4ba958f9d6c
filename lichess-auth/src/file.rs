//! Token file on disk.
//!
//! The file holds the bare token text. Surrounding whitespace is ignored on
//! load, and an empty file counts as "no token". Expiry is not persisted.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use zeroize::Zeroizing;

use crate::{AuthError, AuthToken, TokenStore};

/// Persists the bearer token in a file (created with mode 0600 on Unix).
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create with the path to the token file. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<AuthToken>, AuthError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::BackendError(format!(
                    "failed to read token file: {e}"
                )));
            }
        };
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| AuthError::Invalid("token file is not valid UTF-8".into()))?
            .trim();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(AuthToken::new(text)))
    }

    async fn store(&self, token: AuthToken) -> Result<(), AuthError> {
        if token.is_empty() {
            return Err(AuthError::Invalid("empty token".into()));
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::BackendError(format!("failed to create token dir: {e}")))?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options
            .open(&self.path)
            .await
            .map_err(|e| AuthError::BackendError(format!("failed to open token file: {e}")))?;

        // A file that already existed keeps its old mode until tightened here.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| {
                    AuthError::BackendError(format!("failed to restrict token file: {e}"))
                })?;
        }

        let contents = token.with_secret(|t| Zeroizing::new(t.as_bytes().to_vec()));
        file.write_all(&contents)
            .await
            .map_err(|e| AuthError::BackendError(format!("failed to write token file: {e}")))?;
        file.flush()
            .await
            .map_err(|e| AuthError::BackendError(format!("failed to write token file: {e}")))?;

        tracing::debug!(path = %self.path.display(), "stored access token");
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "removed access token");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::BackendError(format!(
                "failed to remove token file: {e}"
            ))),
        }
    }
}
