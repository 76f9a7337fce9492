#![warn(missing_docs)]
//! # cipherdesk-http
//!
//! ## Purpose
//! Provides the `reqwest` transport behind probing and transforms.
//!
//! ## Responsibilities
//! - Perform liveness `GET` requests for [`cipherdesk_probe::ServiceProbe`].
//! - Perform JSON `POST` requests for [`cipherdesk_transform::TransformClient`].
//!
//! ## Data flow
//! Probe/transform clients -> [`HttpTransport`] -> remote service.
//!
//! ## Ownership and lifetimes
//! One pooled `reqwest::Client` is shared by both traits; clone the transport
//! or wrap it in `Arc` to share it.
//!
//! ## Error model
//! Network failures map into each trait's transport error variant. The
//! transport sets no request timeout: probe attempts are bounded by the probe
//! itself and transforms are intentionally unbounded.
//!
//! ## Security and privacy notes
//! The authorization code only travels in the `Authorization` header and the
//! JSON body; it is never logged here.

use async_trait::async_trait;
use cipherdesk_contract::TransformRequest;
use cipherdesk_probe::{LivenessTransport, ProbeError};
use cipherdesk_transform::{TransformError, TransformTransport, TransportResponse};
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("cipherdesk/", env!("CARGO_PKG_VERSION"));

/// HTTP transport shared by probe and transform clients.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Starts building a transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Builds a transport with default settings.
    ///
    /// # Errors
    /// Returns [`HttpTransportError::Build`] when the TLS backend fails to
    /// initialize.
    pub fn new() -> Result<Self, HttpTransportError> {
        Self::builder().build()
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    user_agent: String,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpTransportBuilder {
    /// Overrides the user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    /// Returns [`HttpTransportError::Build`] when the client cannot be built.
    pub fn build(self) -> Result<HttpTransport, HttpTransportError> {
        let client = Client::builder()
            .user_agent(self.user_agent)
            .build()
            .map_err(HttpTransportError::Build)?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl LivenessTransport for HttpTransport {
    async fn probe(&self, url: &Url) -> Result<u16, ProbeError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|error| ProbeError::Transport(error.to_string()))?;
        let status = response.status().as_u16();
        debug!(stage = "http", action = "liveness_response", %url, status);
        Ok(status)
    }
}

#[async_trait]
impl TransformTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &Url,
        authorization: &str,
        request: &TransformRequest,
    ) -> Result<TransportResponse, TransformError> {
        let response = self
            .client
            .post(url.clone())
            .header(AUTHORIZATION, authorization)
            .json(request)
            .send()
            .await
            .map_err(|error| TransformError::Transport(error.to_string()))?;

        let status = response.status().as_u16();
        debug!(stage = "http", action = "transform_response", %url, status);
        let body = response
            .text()
            .await
            .map_err(|error| TransformError::Transport(error.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

/// Errors produced while building the transport.
#[derive(Debug, Error)]
pub enum HttpTransportError {
    /// `reqwest` client construction failed.
    #[error("http client build failure: {0}")]
    Build(#[source] reqwest::Error),
}
