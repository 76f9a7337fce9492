#![warn(missing_docs)]
//! # cipherdesk-ui
//!
//! ## Purpose
//! Defines the application state record shared by every shell action.
//!
//! ## Responsibilities
//! - Hold payload, authorization code, result text, busy flag, and service
//!   status in one explicit, serializable struct.
//! - Guarantee the busy flag is cleared when an operation finishes.
//! - Export result text to a clipboard sink or a `result.txt` file.
//!
//! ## Data flow
//! Shell actions borrow [`AppState`] mutably, raise the busy flag through
//! [`AppState::begin_busy`], and write their outcome back before the guard
//! drops.
//!
//! ## Ownership and lifetimes
//! `AppState` owns all values. Exactly one action holds `&mut AppState` at a
//! time, which is the only synchronization the single-threaded shell needs.
//!
//! ## Error model
//! State updates are infallible. Only exports return [`ExportError`].
//!
//! ## Security and privacy notes
//! The authorization code is skipped when state is serialized.

use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use cipherdesk_core::{AuthorizationCode, Payload};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name used when the result is downloaded.
pub const RESULT_FILE_NAME: &str = "result.txt";

/// Remote service readiness as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
    /// Not probed yet.
    Unknown,
    /// Probe loop is running.
    Waking,
    /// Probe observed the ready signal.
    Ready,
}

/// Aggregate application state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    /// Active payload.
    pub payload: Payload,
    /// Authorization code; never serialized.
    #[serde(skip)]
    pub code: AuthorizationCode,
    /// Last transform result or error text.
    pub result: String,
    /// Whether an operation is in flight.
    pub busy: bool,
    /// Remote service readiness.
    pub service: ServiceStatus,
}

impl AppState {
    /// Creates empty state.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            payload: Payload::new(),
            code: AuthorizationCode::default(),
            result: String::new(),
            busy: false,
            service: ServiceStatus::Unknown,
        }
    }

    /// Replaces the payload with manually typed text.
    pub fn edit_payload(&mut self, text: impl Into<String>) {
        self.payload = Payload::typed(text);
    }

    /// Installs an already validated payload.
    pub fn install_payload(&mut self, payload: Payload) {
        self.payload = payload;
    }

    /// Replaces the authorization code.
    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = AuthorizationCode::new(code);
    }

    /// Replaces the result text.
    pub fn set_result(&mut self, result: impl Into<String>) {
        self.result = result.into();
    }

    /// Returns `true` when there is a result to export.
    pub fn has_result(&self) -> bool {
        !self.result.is_empty()
    }

    /// Raises the busy flag until the returned guard drops.
    pub fn begin_busy(&mut self) -> BusyGuard<'_> {
        self.busy = true;
        BusyGuard { state: self }
    }

    /// Serializes a display snapshot to pretty JSON.
    ///
    /// # Errors
    /// Returns [`ExportError::Snapshot`] when serialization fails.
    pub fn snapshot_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(ExportError::Snapshot)
    }
}

/// Holds the busy flag raised; clears it on drop, including during unwinding.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    state: &'a mut AppState,
}

impl Deref for BusyGuard<'_> {
    type Target = AppState;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl DerefMut for BusyGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.busy = false;
    }
}

/// Destination for copied result text.
pub trait ClipboardSink {
    /// Replaces clipboard contents with `text`.
    fn write_text(&mut self, text: &str) -> Result<(), ExportError>;
}

/// Copies the result to `sink`.
///
/// Returns `Ok(false)` without touching the sink when there is no result.
///
/// # Errors
/// Propagates sink failures.
pub fn copy_result(state: &AppState, sink: &mut dyn ClipboardSink) -> Result<bool, ExportError> {
    if !state.has_result() {
        return Ok(false);
    }

    sink.write_text(&state.result)?;
    Ok(true)
}

/// Writes the result to `<dir>/result.txt`, overwriting any previous file.
///
/// Returns `Ok(None)` without touching the filesystem when there is no result.
///
/// # Errors
/// Returns [`ExportError::Io`] when the file cannot be written.
pub fn download_result(state: &AppState, dir: &Path) -> Result<Option<PathBuf>, ExportError> {
    if !state.has_result() {
        return Ok(None);
    }

    let path = dir.join(RESULT_FILE_NAME);
    fs::write(&path, state.result.as_bytes())?;
    Ok(Some(path))
}

/// Result export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem write failed.
    #[error("result export failed: {0}")]
    Io(#[from] std::io::Error),
    /// Clipboard sink rejected the text.
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    /// State snapshot serialization failed.
    #[error("state snapshot failed: {0}")]
    Snapshot(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for busy flag handling.

    use super::*;

    #[test]
    fn busy_flag_clears_when_guard_drops() {
        let mut state = AppState::new("v0.1.0");
        {
            let mut busy = state.begin_busy();
            assert!(busy.busy);
            busy.set_result("done");
        }
        assert!(!state.busy);
        assert_eq!(state.result, "done");
    }

    #[test]
    fn busy_flag_clears_on_unwind() {
        let mut state = AppState::new("v0.1.0");
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _busy = state.begin_busy();
            panic!("operation blew up");
        }));
        assert!(outcome.is_err());
        assert!(!state.busy);
    }
}
