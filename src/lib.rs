//! # doc2md-client
//!
//! Client library for a document-to-Markdown conversion service.
//!
//! The service does the heavy lifting (DOCX, PDF, RTF, TXT → Markdown); this
//! crate is the thin layer in front of it that a UI talks to.
//!
//! ## Layers
//!
//! ```text
//! UI / CLI
//!  │  actions, lookups, subscriptions
//!  ▼
//! Store        AppState { supported_formats, conversion_result, is_loading, error }
//!  │  one call per workflow
//!  ▼
//! ApiClient    GET /formats · GET /health · POST /convert (multipart)
//!  │
//!  ▼
//! conversion service
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2md_client::{ApiClient, ClientConfig, ConversionOptions, DocumentFile, Store};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ClientConfig::default())?;
//!     let store = Store::new(client);
//!
//!     store.fetch_supported_formats().await?;
//!     if store.is_supported_format("report.docx") {
//!         let file = DocumentFile::from_path("report.docx").await?;
//!         store.convert_document(&file, &ConversionOptions::default()).await?;
//!     }
//!
//!     let state = store.state();
//!     match (state.error.as_deref(), state.conversion_response()) {
//!         (Some(err), _) => eprintln!("failed: {err}"),
//!         (None, Some(out)) => println!("{}", out.content.unwrap_or_default()),
//!         (None, None) => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2md` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::ApiClient;
pub use config::{ClientConfig, ClientConfigBuilder, ConversionOptions, ResolvedOptions};
pub use error::{ClientError, WorkflowError};
pub use input::DocumentFile;
pub use output::{ConversionResponse, FormatsResponse, HealthResponse};
pub use store::{AppState, Store, CONVERSION_FAILED, FETCH_FORMATS_FAILED};
