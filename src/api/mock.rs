//! Scripted [`ApiClient`] for unit tests

use super::{ApiClient, Request, Response};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct MockApiClient {
    replies: Mutex<VecDeque<Result<Response>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockApiClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, response: Response) -> Self {
        self.replies.lock().unwrap().push_back(Ok(response));
        self
    }

    pub(crate) fn fail(self, error: crate::Error) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn send(&self, request: Request) -> Result<Response> {
        let endpoint = request.endpoint.clone();
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {}", endpoint))
    }
}
