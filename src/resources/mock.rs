//! Scripted [`EntityService`] for resource service tests

use crate::api::Options;
use crate::error::Result;
use crate::services::EntityService;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded call: operation name, entity id, action and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub op: &'static str,
    pub id: Option<String>,
    pub action: Option<String>,
    pub body: Vec<u8>,
    pub options: Options,
}

#[derive(Default)]
pub(crate) struct MockEntityService {
    replies: Mutex<VecDeque<Result<Vec<u8>>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockEntityService {
    pub(crate) fn returning(reply: Result<Vec<u8>>) -> Self {
        let mock = Self::default();
        mock.replies.lock().unwrap().push_back(reply);
        mock
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        op: &'static str,
        id: Option<&str>,
        action: Option<&str>,
        body: Vec<u8>,
        options: &Options,
    ) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(Call {
            op,
            id: id.map(str::to_string),
            action: action.map(str::to_string),
            body,
            options: options.clone(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected {} call", op))
    }
}

#[async_trait]
impl EntityService for MockEntityService {
    async fn get(&self, id: &str, options: &Options) -> Result<Vec<u8>> {
        self.record("get", Some(id), None, Vec::new(), options)
    }

    async fn list(&self, options: &Options) -> Result<Vec<u8>> {
        self.record("list", None, None, Vec::new(), options)
    }

    async fn create(&self, body: Vec<u8>, options: &Options) -> Result<Vec<u8>> {
        self.record("create", None, None, body, options)
    }

    async fn update(&self, id: &str, body: Vec<u8>, options: &Options) -> Result<Vec<u8>> {
        self.record("update", Some(id), None, body, options)
    }

    async fn delete(&self, id: &str, body: Vec<u8>, options: &Options) -> Result<Vec<u8>> {
        self.record("delete", Some(id), None, body, options)
    }

    async fn execute(
        &self,
        id: &str,
        operation: &str,
        body: Vec<u8>,
        options: &Options,
    ) -> Result<Vec<u8>> {
        self.record("execute", Some(id), Some(operation), body, options)
    }
}
