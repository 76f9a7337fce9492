#![warn(missing_docs)]
//! # cipherdesk-probe
//!
//! ## Purpose
//! Wakes the remote transform service and waits until it reports ready.
//!
//! ## Responsibilities
//! - Issue liveness requests through an injectable [`LivenessTransport`].
//! - Bound each attempt by a timeout and pause a fixed delay between attempts.
//! - Model the retry loop as an explicit [`ProbeStateMachine`].
//!
//! ## Data flow
//! [`ServiceProbe::await_ready`] drives the state machine:
//! `Attempting -> (404) -> Ready` or
//! `Attempting -> (other status | error | timeout) -> WaitingToRetry -> Attempting`.
//!
//! ## Ownership and lifetimes
//! The probe owns its base URL and shares transport/sleeper through `Arc` so
//! the same HTTP client can back both probing and transforms.
//!
//! ## Error model
//! The loop itself never fails. Per-attempt failures are recorded as
//! [`AttemptFailure`] and retried without limit. Only construction returns
//! [`ProbeError`].
//!
//! ## Security and privacy notes
//! Liveness requests carry no payload or authorization code.
//!
//! ## Example
//! ```rust
//! use cipherdesk_probe::{ProbeState, ProbeStateMachine};
//!
//! let mut machine = ProbeStateMachine::new();
//! machine.on_attempt_result(Ok(404));
//! assert_eq!(machine.state(), &ProbeState::Ready { attempts: 1 });
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cipherdesk_core::parse_base_url;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Status code the remote service answers with once it is awake.
pub const READY_STATUS: u16 = 404;

/// Default per-attempt timeout.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Default pause between a failed attempt and the next one.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2_000);

/// Timing configuration for the readiness loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    attempt_timeout: Duration,
    retry_delay: Duration,
}

impl ProbeConfig {
    /// Creates a validated probe configuration.
    ///
    /// # Errors
    /// Returns [`ProbeError::InvalidConfig`] when either duration is zero.
    pub fn new(attempt_timeout: Duration, retry_delay: Duration) -> Result<Self, ProbeError> {
        if attempt_timeout.is_zero() {
            return Err(ProbeError::InvalidConfig(
                "attempt timeout must be greater than zero".to_string(),
            ));
        }

        if retry_delay.is_zero() {
            return Err(ProbeError::InvalidConfig(
                "retry delay must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            attempt_timeout,
            retry_delay,
        })
    }

    /// Per-attempt timeout.
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Fixed delay between attempts.
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Why one liveness attempt did not count as ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// Service answered with a status other than [`READY_STATUS`].
    UnexpectedStatus(u16),
    /// Attempt exceeded the configured timeout and was aborted.
    TimedOut(Duration),
    /// Network-level failure.
    Transport(String),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedStatus(status) => write!(f, "unexpected status {status}"),
            Self::TimedOut(timeout) => write!(f, "timed out after {} ms", timeout.as_millis()),
            Self::Transport(message) => write!(f, "transport failure: {message}"),
        }
    }
}

impl From<ProbeError> for AttemptFailure {
    fn from(error: ProbeError) -> Self {
        match error {
            ProbeError::Transport(message) => Self::Transport(message),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Readiness loop state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    /// A liveness request is in flight.
    Attempting {
        /// 1-based attempt number.
        attempt: u64,
    },
    /// Last attempt failed; waiting out the retry delay.
    WaitingToRetry {
        /// Attempt number that failed.
        attempt: u64,
        /// Reason the attempt failed.
        failure: AttemptFailure,
    },
    /// Service reported ready. Terminal.
    Ready {
        /// Total attempts made, including the successful one.
        attempts: u64,
    },
}

/// Readiness state machine with explicit legal transitions.
#[derive(Debug, Clone)]
pub struct ProbeStateMachine {
    state: ProbeState,
}

impl ProbeStateMachine {
    /// Creates a machine in `Attempting { attempt: 1 }`.
    pub fn new() -> Self {
        Self {
            state: ProbeState::Attempting { attempt: 1 },
        }
    }

    /// Returns current state snapshot.
    pub fn state(&self) -> &ProbeState {
        &self.state
    }

    /// Returns `true` once the terminal state is reached.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, ProbeState::Ready { .. })
    }

    /// Applies the outcome of the in-flight attempt.
    ///
    /// Ignored unless the machine is `Attempting`.
    pub fn on_attempt_result(&mut self, result: Result<u16, AttemptFailure>) {
        let ProbeState::Attempting { attempt } = self.state else {
            return;
        };

        self.state = match result {
            Ok(READY_STATUS) => ProbeState::Ready { attempts: attempt },
            Ok(status) => ProbeState::WaitingToRetry {
                attempt,
                failure: AttemptFailure::UnexpectedStatus(status),
            },
            Err(failure) => ProbeState::WaitingToRetry { attempt, failure },
        };
    }

    /// Moves from `WaitingToRetry` to the next attempt.
    ///
    /// Ignored unless the machine is `WaitingToRetry`.
    pub fn on_retry_elapsed(&mut self) {
        if let ProbeState::WaitingToRetry { attempt, .. } = self.state {
            self.state = ProbeState::Attempting {
                attempt: attempt.saturating_add(1),
            };
        }
    }
}

impl Default for ProbeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary returned once the service is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    /// Total attempts, including the successful one.
    pub attempts: u64,
    /// Attempts that failed and were retried.
    pub retries: u64,
}

/// Abstract transport that performs one liveness request.
#[async_trait]
pub trait LivenessTransport: Send + Sync {
    /// Sends `GET url` and returns the response status code.
    async fn probe(&self, url: &Url) -> Result<u16, ProbeError>;
}

/// Suspends the readiness loop between attempts.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Waits for `delay`.
    async fn sleep(&self, delay: Duration);
}

/// [`RetrySleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Polls the remote service until it reports ready.
#[derive(Clone)]
pub struct ServiceProbe {
    url: Url,
    config: ProbeConfig,
    transport: Arc<dyn LivenessTransport>,
    sleeper: Arc<dyn RetrySleeper>,
}

impl ServiceProbe {
    /// Creates a probe against `base_url` using the tokio timer for delays.
    ///
    /// # Errors
    /// Returns [`ProbeError::InvalidUrl`] when the base URL is unusable.
    pub fn new(
        base_url: &str,
        config: ProbeConfig,
        transport: Arc<dyn LivenessTransport>,
    ) -> Result<Self, ProbeError> {
        let url =
            parse_base_url(base_url).map_err(|error| ProbeError::InvalidUrl(error.to_string()))?;
        Ok(Self {
            url,
            config,
            transport,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replaces the retry sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn RetrySleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Liveness URL this probe targets.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Active timing configuration.
    pub fn config(&self) -> ProbeConfig {
        self.config
    }

    /// Retries liveness requests until the ready status is observed.
    ///
    /// Attempts run strictly one after another. There is no retry limit, so
    /// this only returns once the service answers [`READY_STATUS`]; callers
    /// that need an upper bound wrap the future in their own timeout.
    pub async fn await_ready(&self) -> ProbeReport {
        let mut machine = ProbeStateMachine::new();

        loop {
            match machine.state().clone() {
                ProbeState::Attempting { attempt } => {
                    debug!(stage = "probe", action = "attempt", attempt, url = %self.url);
                    let result = self.attempt_once().await;
                    machine.on_attempt_result(result);
                }
                ProbeState::WaitingToRetry { attempt, failure } => {
                    warn!(
                        stage = "probe",
                        action = "retry_scheduled",
                        attempt,
                        delay_ms = self.config.retry_delay.as_millis() as u64,
                        %failure,
                    );
                    self.sleeper.sleep(self.config.retry_delay).await;
                    machine.on_retry_elapsed();
                }
                ProbeState::Ready { attempts } => {
                    info!(stage = "probe", action = "ready", attempts);
                    return ProbeReport {
                        attempts,
                        retries: attempts.saturating_sub(1),
                    };
                }
            }
        }
    }

    async fn attempt_once(&self) -> Result<u16, AttemptFailure> {
        // Dropping the transport future on timeout aborts the in-flight request.
        match tokio::time::timeout(self.config.attempt_timeout, self.transport.probe(&self.url))
            .await
        {
            Ok(Ok(status)) => Ok(status),
            Ok(Err(error)) => Err(AttemptFailure::from(error)),
            Err(_) => Err(AttemptFailure::TimedOut(self.config.attempt_timeout)),
        }
    }
}

/// Errors produced by probe construction and transports.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Timing configuration is unusable.
    #[error("invalid probe config: {0}")]
    InvalidConfig(String),
    /// Base URL is unusable.
    #[error("invalid probe url: {0}")]
    InvalidUrl(String),
    /// Liveness request failed at the network layer.
    #[error("probe transport failure: {0}")]
    Transport(String),
}
