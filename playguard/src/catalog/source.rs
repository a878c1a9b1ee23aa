//! Catalog Sources
//!
//! The engine never performs I/O: a catalog snapshot is fetched up front
//! through one of these sources and passed in as an in-memory [`Catalog`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use super::Catalog;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const COMPONENTS_PATH: &str = "components";

#[derive(Debug, Error)]
pub enum CatalogSourceError {
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Catalog service returned status {status}")]
    Status { status: u16 },
}

/// Anything that can produce a catalog snapshot.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Catalog, CatalogSourceError>;
}

/// Wraps a catalog that is already in memory.
pub struct StaticCatalogSource {
    catalog: Catalog,
}

impl StaticCatalogSource {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Catalog, CatalogSourceError> {
        Ok(self.catalog.clone())
    }
}

/// Reads a JSON catalog export from disk.
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self) -> Result<Catalog, CatalogSourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogSourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let catalog = Catalog::from_json_str(&content)?;
        tracing::info!(
            "Loaded {} catalog entries from {}",
            catalog.len(),
            self.path.display()
        );
        Ok(catalog)
    }
}

/// Fetches the catalog from the component-listing service
/// (`GET {base_url}/components`).
pub struct HttpCatalogSource {
    client: Client,
    base_url: String,
}

impl HttpCatalogSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn components_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), COMPONENTS_PATH)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> Result<Catalog, CatalogSourceError> {
        let url = self.components_url();
        tracing::debug!("Fetching catalog from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogSourceError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let catalog = Catalog::from_json_str(&body)?;
        tracing::info!("Loaded {} catalog entries from {}", catalog.len(), url);
        Ok(catalog)
    }
}
