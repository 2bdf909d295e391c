//! Scripted in-memory backend for tests and offline demos.
//!
//! Responses are keyed by [`ApiRequest`]. A request can be *held* so its
//! response is delivered only after [`MockBackend::release`], which lets
//! tests force out-of-order completion.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

use super::{AnalyticsBackend, ApiRequest};
use crate::error::{ExplorerError, Result};

#[derive(Default)]
pub struct MockBackend {
    /// Scripted outcome per request.
    responses: Mutex<HashMap<ApiRequest, Result<Value>>>,
    /// Requests whose responses are held until released.
    gates: Mutex<HashMap<ApiRequest, watch::Sender<bool>>>,
    /// Every request received, in arrival order.
    call_log: Mutex<Vec<ApiRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful JSON body for a request.
    pub fn respond(&self, request: ApiRequest, body: Value) {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).insert(request, Ok(body));
    }

    /// Script a failure for a request.
    pub fn fail(&self, request: ApiRequest, error: ExplorerError) {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).insert(request, Err(error));
    }

    /// Hold the response to `request` until [`MockBackend::release`].
    pub fn hold(&self, request: ApiRequest) {
        let (tx, _rx) = watch::channel(false);
        self.gates.lock().unwrap_or_else(PoisonError::into_inner).insert(request, tx);
    }

    /// Let every pending and future call of `request` complete.
    pub fn release(&self, request: &ApiRequest) {
        if let Some(tx) = self.gates.lock().unwrap_or_else(PoisonError::into_inner).get(request) {
            tx.send_replace(true);
        }
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.call_log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn was_called(&self, request: &ApiRequest) -> bool {
        self.call_log.lock().unwrap_or_else(PoisonError::into_inner).contains(request)
    }
}

#[async_trait]
impl AnalyticsBackend for MockBackend {
    async fn get(&self, request: &ApiRequest) -> Result<Value> {
        self.call_log.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());

        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(request)
            .map(|tx| tx.subscribe());
        if let Some(mut rx) = gate {
            // A dropped sender means the mock itself is gone; stop waiting.
            let _ = rx.wait_for(|open| *open).await;
        }

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(request)
            .cloned()
            .unwrap_or_else(|| {
                Err(ExplorerError::Transport {
                    message: format!("no scripted response for {:?}", request),
                })
            })
    }
}
