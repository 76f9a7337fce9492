#![warn(missing_docs)]
//! # cipherdesk-app
//!
//! ## Purpose
//! Orchestrates payload loading, service wake-up, transforms, and result
//! export for `cipherdesk`.
//!
//! ## Responsibilities
//! - Resolve runtime configuration (base URL, probe timing).
//! - Gate file-loaded payloads through the alphabet validator.
//! - Run the readiness probe and transforms against [`AppState`], keeping the
//!   busy flag and service status accurate.
//! - Install structured logging and redact secrets from log text.
//!
//! ## Data flow
//! CLI args -> [`AppConfig`] -> [`Services`].
//! File bytes -> [`load_payload_bytes`] -> `AppState.payload`.
//! `AppState` -> [`run_transform`] / [`refresh_service`] -> `AppState.result`
//! / `AppState.service`.
//!
//! ## Ownership and lifetimes
//! Entry points borrow `AppState` mutably for their whole duration, so at most
//! one action writes state at a time without locks.
//!
//! ## Error model
//! Local setup failures are wrapped in [`AppError`]. Remote failures never
//! surface as errors here; they become `Error: ...` result text.
//!
//! ## Security and privacy notes
//! - Authorization codes are never logged; [`redact_sensitive`] strips them
//!   from free-form log text.
//! - Payloads are logged only as fingerprints.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cipherdesk_core::{CoreError, TransformOperation, decode_payload_bytes, validate_payload};
use cipherdesk_http::{HttpTransport, HttpTransportError};
use cipherdesk_probe::{ProbeConfig, ProbeError, ProbeReport, ServiceProbe};
use cipherdesk_transform::{
    TransformClient, TransformError, classify_transform_error, display_outcome,
};
use cipherdesk_ui::{AppState, ExportError, ServiceStatus};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("CIPHERDESK_VERSION");

/// Remote service used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://datastore-1mtx.onrender.com";

/// Env var holding the tracing filter directive.
pub const LOG_FILTER_ENV: &str = "CIPHERDESK_LOG";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Remote service base URL.
    pub base_url: String,
    /// Readiness probe timing.
    pub probe: ProbeConfig,
}

impl AppConfig {
    /// Builds configuration from raw values.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for an empty base URL and
    /// [`AppError::Probe`] for zero timing values.
    pub fn new(
        base_url: impl Into<String>,
        probe_timeout_ms: u64,
        retry_delay_ms: u64,
    ) -> Result<Self, AppError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(AppError::Config("base url must be non-empty".to_string()));
        }

        let probe = ProbeConfig::new(
            Duration::from_millis(probe_timeout_ms),
            Duration::from_millis(retry_delay_ms),
        )?;

        Ok(Self { base_url, probe })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            probe: ProbeConfig::default(),
        }
    }
}

/// Probe and transform clients wired to the same base URL.
#[derive(Clone)]
pub struct Services {
    /// Readiness probe.
    pub probe: ServiceProbe,
    /// Transform client.
    pub transform: TransformClient,
}

impl Services {
    /// Builds both clients over one shared HTTP transport.
    ///
    /// # Errors
    /// Returns [`AppError::Http`] when the HTTP client cannot be built, or the
    /// probe/transform error when the base URL is unusable.
    pub fn connect(config: &AppConfig) -> Result<Self, AppError> {
        if !is_https_endpoint(&config.base_url) {
            warn!(
                stage = "config",
                action = "insecure_endpoint",
                base_url = %config.base_url,
                "base url does not use https; authorization codes travel in clear text"
            );
        }

        let transport = Arc::new(HttpTransport::new()?);
        let probe = ServiceProbe::new(&config.base_url, config.probe, transport.clone())?;
        let transform = TransformClient::new(&config.base_url, transport)?;
        Ok(Self { probe, transform })
    }
}

/// Installs the global `tracing` subscriber.
///
/// The filter comes from `CIPHERDESK_LOG` and defaults to `info`. Logs go to
/// stderr so stdout stays reserved for results.
///
/// # Errors
/// Returns [`AppError::Logging`] when a subscriber is already installed or
/// the filter directive is invalid.
pub fn init_tracing() -> Result<(), AppError> {
    let filter = match std::env::var(LOG_FILTER_ENV) {
        Ok(directive) => EnvFilter::try_new(directive)
            .map_err(|error| AppError::Logging(error.to_string()))?,
        Err(_) => EnvFilter::new("info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| AppError::Logging(error.to_string()))
}

/// Returns `true` when endpoint URL is HTTPS.
pub fn is_https_endpoint(endpoint: &str) -> bool {
    Url::parse(endpoint)
        .map(|url| url.scheme() == "https")
        .unwrap_or(false)
}

/// Redacts common secret markers in log-safe output.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for key in ["authorization", "bearer", "secret", "token"] {
        redacted = redact_key_value(&redacted, key);
    }
    redacted
}

fn redact_key_value(input: &str, key: &str) -> String {
    let lower = input.to_ascii_lowercase();
    if let Some(position) = lower.find(key) {
        let prefix = &input[..position];
        return format!("{prefix}{key}=<redacted>");
    }

    input.to_string()
}

/// User-facing text for a rejected payload character.
pub fn rejection_alert(rejected: char) -> String {
    format!("--{rejected}--")
}

/// Decodes, validates, and installs file content as the active payload.
///
/// On rejection the current payload is left untouched.
///
/// # Errors
/// Returns [`AppError::Validation`] naming the first disallowed character.
pub fn load_payload_bytes(state: &mut AppState, raw: &[u8]) -> Result<(), AppError> {
    let text = decode_payload_bytes(raw);
    let payload = validate_payload(text).inspect_err(|error| {
        warn!(stage = "payload", action = "rejected", %error);
    })?;

    info!(
        stage = "payload",
        action = "loaded",
        chars = payload.as_str().chars().count()
    );
    state.install_payload(payload);
    Ok(())
}

/// Reads a file and installs it through [`load_payload_bytes`].
///
/// # Errors
/// Returns [`AppError::Io`] when the file cannot be read and
/// [`AppError::Validation`] when its content is rejected.
pub async fn load_payload_file(state: &mut AppState, path: &Path) -> Result<(), AppError> {
    let raw = tokio::fs::read(path).await?;
    load_payload_bytes(state, &raw)
}

/// Runs one transform and writes its outcome into `state.result`.
///
/// The busy flag is raised for the call and cleared on every exit path.
/// Returns `true` when the service produced a result.
pub async fn run_transform(
    state: &mut AppState,
    client: &TransformClient,
    operation: TransformOperation,
) -> bool {
    let mut busy = state.begin_busy();
    let payload = busy.payload.clone();
    let code = busy.code.clone();

    let outcome = client.transform(operation, &payload, &code).await;
    if let Err(error) = &outcome {
        warn!(
            stage = "transform",
            action = "failed",
            %operation,
            class = ?classify_transform_error(error),
            error = %redact_sensitive(&error.to_string()),
        );
    }

    busy.set_result(display_outcome(&outcome));
    outcome.is_ok()
}

/// Wakes the remote service and waits until it reports ready.
///
/// The busy flag stays raised and the service status reads
/// [`ServiceStatus::Waking`] for the whole loop.
pub async fn refresh_service(state: &mut AppState, probe: &ServiceProbe) -> ProbeReport {
    let mut busy = state.begin_busy();
    busy.service = ServiceStatus::Waking;

    let report = probe.await_ready().await;
    busy.service = ServiceStatus::Ready;
    info!(
        stage = "probe",
        action = "refreshed",
        attempts = report.attempts,
        retries = report.retries
    );
    report
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration is unusable.
    #[error("config error: {0}")]
    Config(String),
    /// Logging could not be initialized.
    #[error("logging error: {0}")]
    Logging(String),
    /// Payload failed alphabet validation.
    #[error("payload rejected: {0}")]
    Validation(#[from] CoreError),
    /// File I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// HTTP transport construction failed.
    #[error("http error: {0}")]
    Http(#[from] HttpTransportError),
    /// Probe construction failed.
    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),
    /// Transform client construction failed.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),
    /// Result export failed.
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}
