#![warn(missing_docs)]
//! # cipherdesk-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `cipherdesk` workspace.
//!
//! ## Responsibilities
//! - Hold the fixed alphabet that file-loaded payloads must stay within.
//! - Validate loaded text against that alphabet, failing on the first
//!   offending character.
//! - Model transform operations, payloads, and authorization codes.
//!
//! ## Data flow
//! Raw file bytes -> [`decode_payload_bytes`] -> [`validate_payload`] ->
//! accepted [`Payload`] installed into application state.
//! Typed text bypasses validation through [`Payload::typed`].
//!
//! ## Ownership and lifetimes
//! Payloads own their text (`String`) and are replaced wholesale; they are
//! never edited in place.
//!
//! ## Error model
//! Alphabet violations return [`CoreError::DisallowedCharacter`] carrying the
//! offending character only. Position is intentionally not reported.
//!
//! ## Security and privacy notes
//! [`AuthorizationCode`] redacts itself in `Debug` output.
//! Payload text should be logged only via [`payload_fingerprint`].
//!
//! ## Example
//! ```rust
//! use cipherdesk_core::{CoreError, validate_payload};
//!
//! let accepted = validate_payload("hello, world!\n").unwrap();
//! assert_eq!(accepted.as_str(), "hello, world!\n");
//!
//! let rejected = validate_payload("AB\u{20ac}CD").unwrap_err();
//! assert!(matches!(rejected, CoreError::DisallowedCharacter('\u{20ac}')));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Every character a file-loaded payload may contain.
///
/// Letters, digits, space, newline, and a fixed symbol set. Carriage return,
/// tab, and non-ASCII characters are deliberately absent.
pub const ALLOWED_ALPHABET: &str = concat!(
    "abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "0123456789",
    " \n",
    "\"}\\(%-!{][&<.:^`>_~,*/';$@|=+#?)",
);

const ALLOWED_TABLE: [bool; 128] = build_allowed_table();

const fn build_allowed_table() -> [bool; 128] {
    let bytes = ALLOWED_ALPHABET.as_bytes();
    let mut table = [false; 128];
    let mut index = 0;
    while index < bytes.len() {
        table[bytes[index] as usize] = true;
        index += 1;
    }
    table
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Returns `true` when `ch` belongs to [`ALLOWED_ALPHABET`].
pub fn is_allowed_char(ch: char) -> bool {
    ch.is_ascii() && ALLOWED_TABLE[ch as usize]
}

/// User data submitted for encryption or decryption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(String);

impl Payload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Wraps manually typed text. No alphabet check is applied.
    pub fn typed(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Borrows payload text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when payload text is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the payload and returns its text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Validates text loaded from a file against [`ALLOWED_ALPHABET`].
///
/// Characters are checked in sequence order and validation stops at the
/// first one outside the alphabet. Empty text is accepted.
///
/// # Errors
/// Returns [`CoreError::DisallowedCharacter`] with the first offending
/// character.
pub fn validate_payload(text: impl Into<String>) -> Result<Payload, CoreError> {
    let text = text.into();
    if let Some(rejected) = text.chars().find(|ch| !is_allowed_char(*ch)) {
        return Err(CoreError::DisallowedCharacter(rejected));
    }

    Ok(Payload(text))
}

/// Decodes raw file bytes the way a text file read does.
///
/// A leading UTF-8 byte-order mark is dropped and invalid sequences become
/// `U+FFFD`. Binary content is not special-cased; it decodes to whatever text
/// it maps to and then fails validation like any other text.
pub fn decode_payload_bytes(raw: &[u8]) -> String {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Transform performed by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformOperation {
    /// Encrypt plaintext.
    Encrypt,
    /// Decrypt ciphertext.
    Decrypt,
}

impl TransformOperation {
    /// Remote endpoint path segment for this operation.
    pub fn endpoint_path(self) -> &'static str {
        match self {
            Self::Encrypt => "enc",
            Self::Decrypt => "decp",
        }
    }

    /// Response body field that carries the result for this operation.
    pub fn response_field(self) -> &'static str {
        match self {
            Self::Encrypt => "data",
            Self::Decrypt => "decp",
        }
    }
}

impl fmt::Display for TransformOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encrypt => f.write_str("encrypt"),
            Self::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// Opaque credential sent verbatim with every transform request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    /// Wraps a user-supplied code. No validation is performed.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Exposes the raw code for transport.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` when no code was supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorizationCode(<redacted>)")
    }
}

/// Parses and normalizes the remote service base URL.
///
/// The returned URL always ends with `/`, so the liveness probe targets
/// `<base>/` and endpoint paths join underneath it.
///
/// # Errors
/// Returns [`CoreError::InvalidBaseUrl`] when the URL does not parse, uses a
/// scheme other than `http`/`https`, or cannot carry a path.
pub fn parse_base_url(raw: &str) -> Result<Url, CoreError> {
    let mut parsed = Url::parse(raw.trim())
        .map_err(|error| CoreError::InvalidBaseUrl(error.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CoreError::InvalidBaseUrl(format!(
            "unsupported scheme {}",
            parsed.scheme()
        )));
    }

    if parsed.cannot_be_a_base() {
        return Err(CoreError::InvalidBaseUrl(
            "base url cannot carry a path".to_string(),
        ));
    }

    if !parsed.path().ends_with('/') {
        let path = format!("{}/", parsed.path());
        parsed.set_path(&path);
    }
    parsed.set_query(None);
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Stable SHA-256 fingerprint of payload text for log correlation.
pub fn payload_fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(digest)
}

/// Error type for core validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Text contains a character outside [`ALLOWED_ALPHABET`].
    #[error("character {0:?} is not allowed in payload")]
    DisallowedCharacter(char),
    /// Remote service base URL is unusable.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}
