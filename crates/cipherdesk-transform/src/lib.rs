#![warn(missing_docs)]
//! # cipherdesk-transform
//!
//! ## Purpose
//! Sends one authorized encrypt or decrypt request to the remote service.
//!
//! ## Responsibilities
//! - Resolve the operation endpoint under the validated base URL.
//! - Send the JSON body and `Authorization` header through an injectable
//!   [`TransformTransport`].
//! - Map responses to a [`TransformResult`] or a [`TransformError`].
//!
//! ## Data flow
//! Payload + code -> [`TransformClient::transform`] -> transport POST ->
//! status check -> operation-specific response parsing -> result text.
//!
//! ## Ownership and lifetimes
//! The client owns its base URL and shares the transport through `Arc`.
//!
//! ## Error model
//! Every failure is returned, never retried. [`display_outcome`] turns any
//! outcome into the text shown to the user (`Error: <message>` on failure).
//!
//! ## Security and privacy notes
//! Payload text is logged only as a fingerprint; the code is never logged.

use std::sync::Arc;

use async_trait::async_trait;
use cipherdesk_contract::{ContractError, TransformRequest, parse_transform_response};
use cipherdesk_core::{
    AuthorizationCode, Payload, TransformOperation, parse_base_url, payload_fingerprint,
};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// Raw response handed back by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl TransportResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract transport used by [`TransformClient`].
#[async_trait]
pub trait TransformTransport: Send + Sync {
    /// POSTs `request` as JSON to `url` with `Authorization: <authorization>`.
    async fn post_json(
        &self,
        url: &Url,
        authorization: &str,
        request: &TransformRequest,
    ) -> Result<TransportResponse, TransformError>;
}

/// Text produced by the remote service for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    /// Operation that produced the text.
    pub operation: TransformOperation,
    /// Result text to display.
    pub text: String,
}

/// Client for the `enc` / `decp` endpoints.
#[derive(Clone)]
pub struct TransformClient {
    base_url: Url,
    transport: Arc<dyn TransformTransport>,
}

impl TransformClient {
    /// Creates a client against a validated base URL.
    ///
    /// # Errors
    /// Returns [`TransformError::InvalidEndpoint`] when the base URL is unusable.
    pub fn new(
        base_url: &str,
        transport: Arc<dyn TransformTransport>,
    ) -> Result<Self, TransformError> {
        let base_url = parse_base_url(base_url)
            .map_err(|error| TransformError::InvalidEndpoint(error.to_string()))?;
        Ok(Self {
            base_url,
            transport,
        })
    }

    /// Returns the endpoint URL for `operation`.
    ///
    /// # Errors
    /// Returns [`TransformError::InvalidEndpoint`] when the path cannot be joined.
    pub fn endpoint(&self, operation: TransformOperation) -> Result<Url, TransformError> {
        self.base_url
            .join(operation.endpoint_path())
            .map_err(|error| TransformError::InvalidEndpoint(error.to_string()))
    }

    /// Sends one transform request. A single attempt, no timeout, no retry.
    ///
    /// # Errors
    /// Returns [`TransformError::Transport`] for network failures,
    /// [`TransformError::Service`] for non-2xx statuses, and
    /// [`TransformError::Parse`] when the body lacks the operation's field.
    pub async fn transform(
        &self,
        operation: TransformOperation,
        payload: &Payload,
        code: &AuthorizationCode,
    ) -> Result<TransformResult, TransformError> {
        let url = self.endpoint(operation)?;
        let request = TransformRequest::new(payload, code);
        info!(
            stage = "transform",
            action = "request",
            %operation,
            %url,
            payload_fingerprint = %payload_fingerprint(payload.as_str()),
        );

        let response = self
            .transport
            .post_json(&url, code.expose(), &request)
            .await
            .inspect_err(|error| {
                warn!(stage = "transform", action = "transport_failed", %operation, %error);
            })?;

        if !response.is_success() {
            warn!(stage = "transform", action = "rejected", %operation, status = response.status);
            return Err(TransformError::Service {
                status: response.status,
            });
        }

        let text = parse_transform_response(operation, &response.body)?;
        info!(stage = "transform", action = "completed", %operation, result_len = text.len());
        Ok(TransformResult { operation, text })
    }
}

/// Returns the text shown for a transform outcome.
pub fn display_outcome(outcome: &Result<TransformResult, TransformError>) -> String {
    match outcome {
        Ok(result) => result.text.clone(),
        Err(error) => format!("Error: {error}"),
    }
}

/// Failure category used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Client-side configuration problem.
    Configuration,
    /// Network-level failure.
    Transport,
    /// Service answered with a non-success status.
    Service,
    /// Response body violated the contract.
    Parse,
}

/// Classifies transform errors.
pub fn classify_transform_error(error: &TransformError) -> FailureClass {
    match error {
        TransformError::InvalidEndpoint(_) => FailureClass::Configuration,
        TransformError::Transport(_) => FailureClass::Transport,
        TransformError::Service { .. } => FailureClass::Service,
        TransformError::Parse(_) => FailureClass::Parse,
    }
}

/// Errors produced by the transform client.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Base URL or endpoint path is unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Request failed at the network layer.
    #[error("{0}")]
    Transport(String),
    /// Service answered with a non-success status.
    #[error("API Error (status {status})")]
    Service {
        /// HTTP status code.
        status: u16,
    },
    /// Response body could not be parsed.
    #[error("invalid response: {0}")]
    Parse(#[from] ContractError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for error classification and outcome display.

    use super::*;

    #[test]
    fn service_errors_display_with_error_prefix() {
        let outcome: Result<TransformResult, TransformError> =
            Err(TransformError::Service { status: 401 });
        assert_eq!(display_outcome(&outcome), "Error: API Error (status 401)");
    }

    #[test]
    fn classifies_each_error_family() {
        assert_eq!(
            classify_transform_error(&TransformError::Transport("reset".to_string())),
            FailureClass::Transport
        );
        assert_eq!(
            classify_transform_error(&TransformError::Service { status: 503 }),
            FailureClass::Service
        );
        assert_eq!(
            classify_transform_error(&TransformError::InvalidEndpoint("bad".to_string())),
            FailureClass::Configuration
        );
    }
}
