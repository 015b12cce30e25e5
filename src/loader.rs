//! Loading spec and mock documents from local files or `http(s)` URLs.

use crate::config::ValidationOptions;
use crate::error::{Error, Result};
use crate::mock::ParsedMock;
use crate::spec::ParsedSpec;
use crate::validation::ValidationOutcome;
use crate::validator::validate_spec_and_mock;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads raw document text from a location.
#[async_trait]
pub trait SourceReader: Send + Sync {
    async fn read(&self, location: &str) -> Result<String>;
}

/// Reads local paths with `tokio::fs` and `http(s)://` locations with `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct DefaultSourceReader {
    client: Option<reqwest::Client>,
}

impl DefaultSourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured HTTP client (proxies, auth headers, timeouts, ...).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    fn client(&self) -> Result<reqwest::Client> {
        match &self.client {
            Some(client) => Ok(client.clone()),
            None => Ok(reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?),
        }
    }

    async fn read_url(&self, url: &str) -> Result<String> {
        let response = self
            .client()?
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Load {
                location: url.to_string(),
                reason: format!("HTTP request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(Error::Load {
                location: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        response.text().await.map_err(|e| Error::Load {
            location: url.to_string(),
            reason: format!("Failed to read response: {}", e),
        })
    }

    async fn read_file(&self, path: &str) -> Result<String> {
        let bytes = tokio::fs::read(path).await.map_err(|e| Error::Load {
            location: path.to_string(),
            reason: e.to_string(),
        })?;
        let bytes = match bytes.strip_prefix(UTF8_BOM) {
            Some(rest) => rest.to_vec(),
            None => bytes,
        };
        String::from_utf8(bytes).map_err(|e| Error::Load {
            location: path.to_string(),
            reason: format!("Invalid UTF-8: {}", e),
        })
    }
}

#[async_trait]
impl SourceReader for DefaultSourceReader {
    async fn read(&self, location: &str) -> Result<String> {
        if is_url(location) {
            tracing::debug!(location, "reading document over http");
            self.read_url(location).await
        } else {
            tracing::debug!(location, "reading document from file");
            self.read_file(location).await
        }
    }
}

fn is_url(location: &str) -> bool {
    Url::parse(location)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Decodes JSON, falling back to YAML.
pub fn decode_document(content: &str) -> Result<Value> {
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(json_error) => {
            tracing::trace!(error = %json_error, "document is not JSON, trying YAML");
            Ok(serde_yaml::from_str(content)?)
        }
    }
}

/// Loads documents through a [`SourceReader`].
pub struct Loader {
    reader: Arc<dyn SourceReader>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self::with_reader(Arc::new(DefaultSourceReader::new()))
    }

    pub fn with_reader(reader: Arc<dyn SourceReader>) -> Self {
        Self { reader }
    }

    async fn document(&self, location: &str) -> Result<Value> {
        let content = self.reader.read(location).await?;
        decode_document(&content).map_err(|e| Error::Load {
            location: location.to_string(),
            reason: e.to_string(),
        })
    }

    /// Loads and parses a Swagger 2 / OpenAPI 3 document.
    pub async fn load_spec(&self, location: &str) -> Result<ParsedSpec> {
        let document = self.document(location).await?;
        Ok(ParsedSpec::from_document(&document)?.with_pathname(location))
    }

    /// Loads and parses a pact file.
    pub async fn load_mock(&self, location: &str) -> Result<ParsedMock> {
        let document = self.document(location).await?;
        Ok(ParsedMock::from_document(&document)?.with_pathname(location))
    }

    /// Loads both documents concurrently and validates the mock against the spec.
    pub async fn validate_files(
        &self,
        mock_location: &str,
        spec_location: &str,
        options: ValidationOptions,
    ) -> Result<ValidationOutcome> {
        let (mock, spec) =
            futures::try_join!(self.load_mock(mock_location), self.load_spec(spec_location))?;
        validate_spec_and_mock(Arc::new(mock), Arc::new(spec), options).await
    }
}

/// Loads a spec with the default reader.
pub async fn load_spec(location: &str) -> Result<ParsedSpec> {
    Loader::new().load_spec(location).await
}

/// Loads a mock with the default reader.
pub async fn load_mock(location: &str) -> Result<ParsedMock> {
    Loader::new().load_mock(location).await
}

/// Loads both documents with the default reader and validates them.
pub async fn validate_files(
    mock_location: &str,
    spec_location: &str,
    options: ValidationOptions,
) -> Result<ValidationOutcome> {
    Loader::new()
        .validate_files(mock_location, spec_location, options)
        .await
}
