//! Where the controller's index comes from.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use trellis_core::{TemplateEntry, TemplatesResponse, TEMPLATES_ENDPOINT};

/// Why a fetch of the index failed. Never shown to the user; the
/// dropdown just shows no results.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Supplies the full template list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn fetch_templates(&self) -> Result<Vec<TemplateEntry>, FetchError>;
}

/// Fetches the index from the templates endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTemplateSource {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpTemplateSource {
    /// `admin_base_url` is the admin area root, e.g.
    /// `http://localhost:7440/admin`.
    pub fn new(admin_base_url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/{}", admin_base_url.trim_end_matches('/'), TEMPLATES_ENDPOINT),
            token,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TemplateSource for HttpTemplateSource {
    async fn fetch_templates(&self) -> Result<Vec<TemplateEntry>, FetchError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(FetchError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: TemplatesResponse = response.json().await.map_err(FetchError::Decode)?;
        debug!("Fetched {} templates from {}", body.templates.len(), self.url);
        Ok(body.templates)
    }
}
