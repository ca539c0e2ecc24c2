//! 测试用传输：按顺序返回预设响应，并记录所有请求

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::transport::{HttpRequest, HttpResponse, Transport, TransportError};

#[derive(Default)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: JsonValue) -> &Self {
        self.push_text(status, body.to_string())
    }

    pub fn push_text(&self, status: u16, body: impl Into<String>) -> &Self {
        self.lock_responses().push_back(Ok(HttpResponse {
            status,
            body: body.into(),
        }));
        self
    }

    /// 模拟没有收到响应
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        self.lock_responses()
            .push_back(Err(TransportError(message.into())));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn lock_responses(
        &self,
    ) -> std::sync::MutexGuard<'_, VecDeque<Result<HttpResponse, TransportError>>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.lock_responses()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("没有预设响应".to_string())))
    }
}
