//! Application state shared between the UI and the conversion service.
//!
//! [`Store`] is an explicit context object: create one per application (or
//! per test) and hand out `Arc<Store>` to whatever needs it. It holds an
//! [`AppState`] and exposes three kinds of entry points:
//!
//! * **Mutations**: synchronous, unconditional writes (`set_*`, `clear_error`).
//! * **Actions**: async workflows bracketing exactly one API call:
//!   [`Store::fetch_supported_formats`] and [`Store::convert_document`].
//! * **Lookups**: pure reads such as [`Store::is_supported_format`].
//!
//! ## Workflow lifecycle
//!
//! ```text
//! Idle ──begin──▶ Loading ──ok──▶ Success ─┐
//!                    │                      ├──▶ Idle (is_loading = false)
//!                    └────err──▶ Failed  ───┘
//! ```
//!
//! Entering `Loading` clears the previous error. Leaving it is tied to a
//! guard's `Drop`, so the flag is reset on success, on failure, and when the
//! workflow future is dropped mid-request.
//!
//! Only one workflow may be in flight. A second one started meanwhile returns
//! [`WorkflowError::InFlight`] without touching state, so a stale completion
//! can never overwrite a newer result.
//!
//! ## Observing state
//!
//! Every mutation publishes a new snapshot on a `tokio::sync::watch` channel.
//! UI components call [`Store::subscribe`] and redraw on `changed()`.

use crate::client::ApiClient;
use crate::config::ConversionOptions;
use crate::error::{ClientError, WorkflowError};
use crate::input::DocumentFile;
use crate::output::ConversionResponse;
use tokio::sync::watch;
use tracing::{info, warn};

/// Shown when fetching formats fails without any usable message.
pub const FETCH_FORMATS_FAILED: &str = "Error fetching formats";

/// Shown when a conversion fails without any usable message.
pub const CONVERSION_FAILED: &str = "Error during conversion";

/// Snapshot of everything the UI renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Extension tokens with a leading dot, in server order.
    pub supported_formats: Vec<String>,
    /// Last successful `/convert` body, verbatim.
    pub conversion_result: Option<serde_json::Value>,
    pub is_loading: bool,
    /// Last failure, ready for display.
    pub error: Option<String>,
}

impl AppState {
    /// Whether `filename`'s extension is one of [`Self::supported_formats`].
    ///
    /// Case-insensitive. Names without a `.` never match.
    pub fn is_supported_format(&self, filename: &str) -> bool {
        match extension_token(filename) {
            Some(token) => self.supported_formats.iter().any(|f| *f == token),
            None => false,
        }
    }

    /// The stored conversion body decoded as a [`ConversionResponse`].
    pub fn conversion_response(&self) -> Option<ConversionResponse> {
        self.conversion_result
            .as_ref()
            .and_then(ConversionResponse::from_value)
    }
}

/// `"Report.PDF"` → `Some(".pdf")`. `None` for empty names or names with no `.`.
pub fn extension_token(filename: &str) -> Option<String> {
    let lower = filename.to_lowercase();
    let (_, ext) = lower.rsplit_once('.')?;
    Some(format!(".{ext}"))
}

/// Shared, observable application state plus the client its actions call.
#[derive(Debug)]
pub struct Store {
    api: ApiClient,
    state: watch::Sender<AppState>,
}

impl Store {
    /// Create a store with empty state.
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self { api, state }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Clone of the current state.
    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    /// See [`AppState::is_supported_format`].
    pub fn is_supported_format(&self, filename: &str) -> bool {
        self.state.borrow().is_supported_format(filename)
    }

    // ── Mutations ────────────────────────────────────────────────────────

    pub fn set_supported_formats(&self, formats: Vec<String>) {
        self.state.send_modify(|s| s.supported_formats = formats);
    }

    pub fn set_conversion_result(&self, result: Option<serde_json::Value>) {
        self.state.send_modify(|s| s.conversion_result = result);
    }

    pub fn set_loading(&self, loading: bool) {
        self.state.send_modify(|s| s.is_loading = loading);
    }

    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|s| s.error = Some(message));
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Refresh [`AppState::supported_formats`] from the service.
    ///
    /// On failure the previous list is kept and [`AppState::error`] is set.
    pub async fn fetch_supported_formats(&self) -> Result<(), WorkflowError> {
        let _loading = self.begin(false)?;

        match self.api.get_formats().await {
            Ok(body) => {
                info!("Service supports {} formats", body.formats.len());
                self.set_supported_formats(body.formats);
            }
            Err(e) => self.set_error(formats_failure_message(&e)),
        }
        Ok(())
    }

    /// Convert `file` and store the response body in
    /// [`AppState::conversion_result`].
    ///
    /// The previous result is cleared before the upload starts.
    pub async fn convert_document(
        &self,
        file: &DocumentFile,
        options: &ConversionOptions,
    ) -> Result<(), WorkflowError> {
        let _loading = self.begin(true)?;

        match self.api.convert_document(file, options).await {
            Ok(body) => {
                info!("Converted '{}'", file.file_name());
                self.set_conversion_result(Some(body));
            }
            Err(e) => self.set_error(conversion_failure_message(&e)),
        }
        Ok(())
    }

    /// Enter `Loading` atomically, or refuse if a workflow is in flight.
    fn begin(&self, clear_result: bool) -> Result<LoadingGuard<'_>, WorkflowError> {
        let started = self.state.send_if_modified(|s| {
            if s.is_loading {
                return false;
            }
            s.is_loading = true;
            s.error = None;
            if clear_result {
                s.conversion_result = None;
            }
            true
        });

        if started {
            Ok(LoadingGuard { state: &self.state })
        } else {
            warn!("Workflow rejected: another request is in flight");
            Err(WorkflowError::InFlight)
        }
    }
}

/// Resets `is_loading` when the workflow scope ends, however it ends.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<AppState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.is_loading = false);
    }
}

/// Message for a failed formats fetch: the error's own message, else its
/// display text (status errors keep their code), else the default.
fn formats_failure_message(err: &ClientError) -> String {
    non_blank(err.message())
        .or_else(|| non_blank(Some(err.to_string())))
        .unwrap_or_else(|| FETCH_FORMATS_FAILED.to_string())
}

/// Message for a failed conversion: the server's `detail`, else the error's
/// own message, else the default.
fn conversion_failure_message(err: &ClientError) -> String {
    non_blank(err.detail().map(str::to_owned))
        .or_else(|| non_blank(err.message()))
        .unwrap_or_else(|| CONVERSION_FAILED.to_string())
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}
