//! Shared stub transports for app integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cipherdesk_contract::TransformRequest;
use cipherdesk_probe::{LivenessTransport, ProbeError};
use cipherdesk_transform::{TransformError, TransformTransport, TransportResponse};
use url::Url;

/// Base URL used by every stubbed client.
#[allow(dead_code)]
pub const BASE_URL: &str = "https://service.example.test";

/// Transform transport answering with one canned outcome.
#[allow(dead_code)]
pub struct CannedTransform {
    outcome: Result<TransportResponse, String>,
}

#[allow(dead_code)]
impl CannedTransform {
    pub fn status(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(TransportResponse {
                status,
                body: body.to_string(),
            }),
        })
    }

    pub fn network_failure(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message.to_string()),
        })
    }
}

#[async_trait]
impl TransformTransport for CannedTransform {
    async fn post_json(
        &self,
        _url: &Url,
        _authorization: &str,
        _request: &TransformRequest,
    ) -> Result<TransportResponse, TransformError> {
        self.outcome.clone().map_err(TransformError::Transport)
    }
}

/// Liveness transport replaying a fixed status sequence, then 404.
#[allow(dead_code)]
pub struct StatusSequence {
    statuses: Mutex<VecDeque<u16>>,
}

#[allow(dead_code)]
impl StatusSequence {
    pub fn new(statuses: &[u16]) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
        })
    }
}

#[async_trait]
impl LivenessTransport for StatusSequence {
    async fn probe(&self, _url: &Url) -> Result<u16, ProbeError> {
        Ok(self
            .statuses
            .lock()
            .expect("status lock should work")
            .pop_front()
            .unwrap_or(404))
    }
}
