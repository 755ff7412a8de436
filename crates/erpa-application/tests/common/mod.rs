//! Scripted backend shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use erpa_core::backend::{Backend, BackendRequest, Endpoint};
use erpa_core::error::{ErpaError, Result};
use serde_json::Value;

/// Replays scripted replies in order and records every request.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<Value>>>,
    calls: Mutex<Vec<BackendRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn reply(&self, body: Value) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(body));
        self
    }

    pub fn fail(&self, err: ErpaError) -> &Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<BackendRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.calls().into_iter().map(|call| call.endpoint).collect()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn call(&self, request: BackendRequest) -> Result<Value> {
        self.calls.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ErpaError::internal("no scripted reply left")))
    }
}
