//! Document Storage
//!
//! Where the checklist lives: a local file or a WebDAV resource (for
//! example a Nextcloud share). Both are reached through [`DocumentStore`]
//! so the companion does not care which one it talks to.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Timeout for a single WebDAV request
pub const WEBDAV_TIMEOUT: Duration = Duration::from_secs(30);

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Required settings are missing
    #[error("storage not configured: missing {0}")]
    NotConfigured(&'static str),

    /// Local file access failed
    #[error("cannot access {path}: {source}")]
    Io {
        /// File that was accessed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The HTTP request could not be made
    #[error("WebDAV request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("WebDAV server answered {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },
}

/// Somewhere a checklist document can be read from and written back to
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable location, for logs
    fn describe(&self) -> String;

    /// Fetch the whole document
    async fn load(&self) -> Result<String, StoreError>;

    /// Replace the whole document
    async fn store(&self, text: &str) -> Result<(), StoreError>;
}

/// Storage location settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreSettings {
    /// A markdown file on the local disk
    File(PathBuf),
    /// A WebDAV resource with basic authentication
    WebDav {
        /// Resource URL
        url: String,
        /// User name
        user: String,
        /// App password
        password: String,
    },
}

impl StoreSettings {
    /// WebDAV settings; every part must be non-empty
    ///
    /// # Errors
    ///
    /// [`StoreError::NotConfigured`] naming the first missing part.
    pub fn webdav(url: &str, user: &str, password: &str) -> Result<Self, StoreError> {
        if url.is_empty() {
            return Err(StoreError::NotConfigured("WebDAV URL"));
        }
        if user.is_empty() {
            return Err(StoreError::NotConfigured("user"));
        }
        if password.is_empty() {
            return Err(StoreError::NotConfigured("app password"));
        }
        Ok(Self::WebDav {
            url: url.to_string(),
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    /// Create the store these settings describe
    ///
    /// # Errors
    ///
    /// [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn open(self) -> Result<Box<dyn DocumentStore>, StoreError> {
        match self {
            Self::File(path) => Ok(Box::new(FileStore::new(path))),
            Self::WebDav {
                url,
                user,
                password,
            } => Ok(Box::new(WebDavStore::new(url, user, password)?)),
        }
    }
}

// ============================================================================
// Local file
// ============================================================================

/// Document kept in a local file
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by `path`
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<String, StoreError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }

    async fn store(&self, text: &str) -> Result<(), StoreError> {
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

// ============================================================================
// WebDAV
// ============================================================================

/// Document kept on a WebDAV server
pub struct WebDavStore {
    url: String,
    user: String,
    password: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for WebDavStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDavStore")
            .field("url", &self.url)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl WebDavStore {
    /// Store for the resource at `url`
    ///
    /// # Errors
    ///
    /// [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn new(url: String, user: String, password: String) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(WEBDAV_TIMEOUT).build()?;
        Ok(Self {
            url,
            user,
            password,
            client,
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DocumentStore for WebDavStore {
    fn describe(&self) -> String {
        format!("{}@{}", self.user, self.url)
    }

    async fn load(&self) -> Result<String, StoreError> {
        let response = self
            .client
            .get(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;

        let text = Self::check(response).await?.text().await?;
        tracing::debug!(url = %self.url, bytes = text.len(), "Fetched document");
        Ok(text)
    }

    async fn store(&self, text: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .put(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .header(reqwest::header::CONTENT_TYPE, "text/markdown")
            .body(text.to_string())
            .send()
            .await?;

        Self::check(response).await?;
        tracing::debug!(url = %self.url, bytes = text.len(), "Uploaded document");
        Ok(())
    }
}
