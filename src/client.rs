//! HTTP wrapper around the conversion service.
//!
//! [`ApiClient`] owns the transport concerns (base URL, timeout, default
//! headers), so call sites only pass business inputs. Every response goes
//! through one interception point ([`intercept`]) that logs failures and
//! hands them back unchanged. Nothing here retries or recovers.

use crate::config::{ClientConfig, ConversionOptions};
use crate::error::ClientError;
use crate::input::DocumentFile;
use crate::output::{FormatsResponse, HealthResponse};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Client for the `/formats`, `/health` and `/convert` endpoints.
///
/// Cheap to clone: the underlying `reqwest::Client` shares its connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Build a client from a validated [`ClientConfig`].
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(config.default_headers().clone())
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET /formats`: extensions the service can convert.
    pub async fn get_formats(&self) -> Result<FormatsResponse, ClientError> {
        let url = self.config.endpoint("formats")?;
        intercept(self.execute(self.http.get(url.clone()), url).await)
    }

    /// `GET /health`: liveness probe.
    pub async fn get_health(&self) -> Result<HealthResponse, ClientError> {
        let url = self.config.endpoint("health")?;
        intercept(self.execute(self.http.get(url.clone()), url).await)
    }

    /// `POST /convert`: upload `file` as multipart with resolved `options`.
    ///
    /// Returns the whole response body; its shape belongs to the service.
    pub async fn convert_document(
        &self,
        file: &DocumentFile,
        options: &ConversionOptions,
    ) -> Result<serde_json::Value, ClientError> {
        let url = self.config.endpoint("convert")?;
        let resolved = options.resolve();
        debug!(
            "Uploading '{}' ({} bytes) with {:?}",
            file.file_name(),
            file.len(),
            resolved
        );

        let mut form = Form::new().part("file", file_part(file));
        for (name, value) in resolved.form_fields() {
            form = form.text(name, value);
        }

        // `multipart` sets its own Content-Type with the boundary, which
        // takes precedence over the JSON default header.
        let request = self.http.post(url.clone()).multipart(form);
        intercept(self.execute(request, url).await)
    }

    /// Send a request and decode a successful JSON body into `T`.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: Url,
    ) -> Result<T, ClientError> {
        debug!("→ {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        let status = response.status();
        debug!("← {} {}", status.as_u16(), url);
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| self.transport_error(&url, e))?;
            return Err(status_error(status, &body));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(&url, e)
            } else {
                ClientError::Decode {
                    url: url.to_string(),
                    source: e,
                }
            }
        })
    }

    fn transport_error(&self, url: &Url, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
                secs: self.config.timeout_secs(),
            }
        } else {
            ClientError::Transport {
                url: url.to_string(),
                source: e,
            }
        }
    }
}

/// The single response-error interception point: log, then pass through.
fn intercept<T>(result: Result<T, ClientError>) -> Result<T, ClientError> {
    result.inspect_err(|e| error!("API error: {}", e))
}

fn file_part(file: &DocumentFile) -> Part {
    let part = || Part::bytes(file.bytes().to_vec()).file_name(file.file_name().to_string());
    part().mime_str(file.mime()).unwrap_or_else(|_| part())
}

/// Turn a non-2xx response into a [`ClientError::Status`].
///
/// A JSON body contributes its string `detail` field; any other non-empty
/// body becomes the plain-text `message`.
fn status_error(status: StatusCode, body: &str) -> ClientError {
    let (detail, message) = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => (
            json.get("detail")
                .and_then(|d| d.as_str())
                .map(str::to_owned),
            None,
        ),
        Err(_) => {
            let text = body.trim();
            (None, (!text.is_empty()).then(|| text.to_string()))
        }
    };
    ClientError::Status {
        status,
        detail,
        message,
    }
}
