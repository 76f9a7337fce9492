#![warn(missing_docs)]
//! # cipherdesk-contract
//!
//! ## Purpose
//! Defines the wire contract of the remote transform service.
//!
//! ## Responsibilities
//! - Build the JSON request body shared by both transform endpoints.
//! - Parse operation-specific response bodies.
//! - Preserve the service's field asymmetry: encrypt answers in `data`,
//!   decrypt answers in `decp`.
//!
//! ## Data flow
//! Payload + code -> [`TransformRequest`] -> transport.
//! Raw JSON response -> [`parse_transform_response`] -> result text.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned strings so they outlive transient response buffers.
//!
//! ## Error model
//! Invalid JSON, a missing result field, or a non-string result field return
//! [`ContractError`].
//!
//! ## Security and privacy notes
//! The request body carries the authorization code; callers must not log it.

use cipherdesk_core::{AuthorizationCode, Payload, TransformOperation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body sent to `enc` and `decp` endpoints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Payload text, verbatim.
    pub data: String,
    /// Authorization code, verbatim.
    pub code: String,
}

impl TransformRequest {
    /// Builds a request body from payload and code.
    pub fn new(payload: &Payload, code: &AuthorizationCode) -> Self {
        Self {
            data: payload.as_str().to_string(),
            code: code.expose().to_string(),
        }
    }

    /// Serializes the body to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`ContractError::Decode`] when JSON serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(self).map_err(ContractError::Decode)
    }
}

impl std::fmt::Debug for TransformRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRequest")
            .field("data_len", &self.data.len())
            .field("code", &"<redacted>")
            .finish()
    }
}

/// Successful encrypt response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptResponse {
    /// Ciphertext produced by the service.
    pub data: String,
}

/// Successful decrypt response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptResponse {
    /// Plaintext produced by the service.
    pub decp: String,
}

/// Parses a successful response body for `operation`.
///
/// Only the field owned by the operation is read; any other field, including
/// a `data` field on a decrypt response, is ignored.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON or a missing/non-string
/// result field.
pub fn parse_transform_response(
    operation: TransformOperation,
    raw: &str,
) -> Result<String, ContractError> {
    match operation {
        TransformOperation::Encrypt => {
            let parsed: EncryptResponse = serde_json::from_str(raw)?;
            Ok(parsed.data)
        }
        TransformOperation::Decrypt => {
            let parsed: DecryptResponse = serde_json::from_str(raw)?;
            Ok(parsed.decp)
        }
    }
}

/// Transform contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON encode/decode failure.
    #[error("response decode failure: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for the field asymmetry between operations.

    use super::*;

    #[test]
    fn decrypt_reads_decp_and_ignores_data() {
        let raw = r#"{"data":"ignored","decp":"secret"}"#;
        let parsed = parse_transform_response(TransformOperation::Decrypt, raw)
            .expect("decrypt response should parse");
        assert_eq!(parsed, "secret");
    }

    #[test]
    fn encrypt_without_data_field_is_rejected() {
        let raw = r#"{"decp":"secret"}"#;
        let error = parse_transform_response(TransformOperation::Encrypt, raw)
            .expect_err("missing data field should fail");
        assert!(error.to_string().contains("data"));
    }
}
