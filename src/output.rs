//! Response bodies returned by the conversion service.

use serde::{Deserialize, Serialize};

/// Body of `GET /formats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatsResponse {
    /// Extension tokens with a leading dot, e.g. `".pdf"`.
    pub formats: Vec<String>,
}

/// Body of `GET /health`.
///
/// Only `status` is guaranteed; older deployments omit `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Typed view of the `POST /convert` body.
///
/// The store keeps the body verbatim as JSON; this is what callers decode it
/// into when they want the Markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResponse {
    #[serde(default)]
    pub success: bool,
    /// Converted Markdown.
    #[serde(default)]
    pub content: Option<String>,
    /// Suggested output name, e.g. `report.md` for `report.docx`.
    #[serde(default)]
    pub filename: Option<String>,
    /// Service-side failure reason when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

impl ConversionResponse {
    /// Decode a stored conversion payload. Returns `None` if the body is not
    /// an object of this shape.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
