//! Configuration types for talking to the conversion service.
//!
//! Two structs live here:
//!
//! * [`ClientConfig`]: transport settings (base URL, timeout, default
//!   headers), built once via [`ClientConfigBuilder`] and immutable after.
//! * [`ConversionOptions`]: the per-request knobs sent with every upload.
//!   Callers set only the fields they care about; [`ConversionOptions::resolve`]
//!   fills in the rest exactly once, right before the request is built.

use crate::error::ClientError;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use std::time::Duration;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Transport configuration for [`crate::ApiClient`].
///
/// # Example
/// ```rust
/// use doc2md_client::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://convert.example.com/api")
///     .timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout().as_secs(), 60);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    timeout_secs: u64,
    default_headers: HeaderMap,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: parse_base_url(DEFAULT_BASE_URL)
                .expect("default base URL is valid"),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_headers: json_headers(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Base URL every endpoint path is appended to. Always ends with `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Headers sent with every request unless the request overrides them.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Absolute URL for an endpoint such as `"formats"`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidConfig(format!("bad endpoint '{path}': {e}")))
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    base_url: String,
    timeout_secs: u64,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        if self.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(ClientConfig {
            base_url: parse_base_url(&self.base_url)?,
            timeout_secs: self.timeout_secs,
            default_headers: json_headers(),
        })
    }
}

/// Parse and normalise a base URL so that `Url::join` appends rather than
/// replaces the last path segment.
fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let raw = raw.trim();
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| ClientError::InvalidConfig(format!("Invalid base URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::InvalidConfig(format!(
            "Base URL must use http or https, got '{other}'"
        ))),
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

// ── Conversion options ───────────────────────────────────────────────────

pub const DEFAULT_PRESERVE_FORMATTING: bool = true;
pub const DEFAULT_INCLUDE_IMAGES: bool = true;
pub const DEFAULT_MAX_IMAGE_SIZE: u32 = 1024;
pub const DEFAULT_TABLE_FORMAT: &str = "grid";

/// Options accepted by the `/convert` endpoint.
///
/// Every field is optional. Values are passed through untouched; the
/// service decides whether e.g. a `table_format` is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionOptions {
    pub preserve_formatting: Option<bool>,
    pub include_images: Option<bool>,
    pub max_image_size: Option<u32>,
    pub table_format: Option<String>,
}

impl ConversionOptions {
    pub fn preserve_formatting(mut self, v: bool) -> Self {
        self.preserve_formatting = Some(v);
        self
    }

    pub fn include_images(mut self, v: bool) -> Self {
        self.include_images = Some(v);
        self
    }

    pub fn max_image_size(mut self, px: u32) -> Self {
        self.max_image_size = Some(px);
        self
    }

    pub fn table_format(mut self, format: impl Into<String>) -> Self {
        self.table_format = Some(format.into());
        self
    }

    /// Fill every absent field with its default.
    pub fn resolve(&self) -> ResolvedOptions {
        ResolvedOptions {
            preserve_formatting: self
                .preserve_formatting
                .unwrap_or(DEFAULT_PRESERVE_FORMATTING),
            include_images: self.include_images.unwrap_or(DEFAULT_INCLUDE_IMAGES),
            max_image_size: self.max_image_size.unwrap_or(DEFAULT_MAX_IMAGE_SIZE),
            table_format: self
                .table_format
                .clone()
                .unwrap_or_else(|| DEFAULT_TABLE_FORMAT.to_string()),
        }
    }
}

/// [`ConversionOptions`] with every field decided; what goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub preserve_formatting: bool,
    pub include_images: bool,
    pub max_image_size: u32,
    pub table_format: String,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        ConversionOptions::default().resolve()
    }
}

impl ResolvedOptions {
    /// Form fields in wire order, values rendered as the service parses them.
    pub fn form_fields(&self) -> [(&'static str, String); 4] {
        [
            ("preserve_formatting", self.preserve_formatting.to_string()),
            ("include_images", self.include_images.to_string()),
            ("max_image_size", self.max_image_size.to_string()),
            ("table_format", self.table_format.clone()),
        ]
    }
}
