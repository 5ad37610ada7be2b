//! Entity Service
//!
//! Resource-agnostic CRUD and action calls. Payloads go in and come out as
//! raw JSON bytes; typed parsing belongs to the resource services.

use super::task::TaskApi;
use crate::api::{ApiClient, Method, Options, Request};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Provisioning scope of an entity collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityContext {
    pub service_code: String,
    pub environment_name: String,
    pub entity_type: String,
}

impl EntityContext {
    pub fn new(
        service_code: impl Into<String>,
        environment_name: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            service_code: service_code.into(),
            environment_name: environment_name.into(),
            entity_type: entity_type.into(),
        }
    }

    /// Collection endpoint: `services/<service>/<environment>/<entity type>`
    pub fn collection_endpoint(&self) -> String {
        format!(
            "services/{}/{}/{}",
            urlencoding::encode(&self.service_code),
            urlencoding::encode(&self.environment_name),
            urlencoding::encode(&self.entity_type)
        )
    }

    pub fn entity_endpoint(&self, id: &str) -> String {
        format!("{}/{}", self.collection_endpoint(), urlencoding::encode(id))
    }

    pub fn operation_endpoint(&self, id: &str, operation: &str) -> String {
        format!("{}/{}", self.entity_endpoint(id), urlencoding::encode(operation))
    }
}

#[async_trait]
pub trait EntityService: Send + Sync {
    async fn get(&self, id: &str, options: &Options) -> Result<Vec<u8>>;

    async fn list(&self, options: &Options) -> Result<Vec<u8>>;

    async fn create(&self, body: Vec<u8>, options: &Options) -> Result<Vec<u8>>;

    async fn update(&self, id: &str, body: Vec<u8>, options: &Options) -> Result<Vec<u8>>;

    async fn delete(&self, id: &str, body: Vec<u8>, options: &Options) -> Result<Vec<u8>>;

    /// Run a named action (`start`, `stop`, `reboot`, ...) on an entity
    async fn execute(
        &self,
        id: &str,
        operation: &str,
        body: Vec<u8>,
        options: &Options,
    ) -> Result<Vec<u8>>;
}

#[derive(Clone)]
struct TaskWait {
    tasks: TaskApi,
    max_attempts: u32,
}

/// [`EntityService`] over an [`ApiClient`]
#[derive(Clone)]
pub struct EntityApi {
    api_client: Arc<dyn ApiClient>,
    context: EntityContext,
    task_wait: Option<TaskWait>,
}

impl EntityApi {
    pub fn new(api_client: Arc<dyn ApiClient>, context: EntityContext) -> Self {
        Self {
            api_client,
            context,
            task_wait: None,
        }
    }

    /// Wait for the task behind asynchronous responses.
    ///
    /// Calls whose response carries an unfinished task then return the task
    /// result instead of the response data.
    pub fn with_task_wait(mut self, tasks: TaskApi, max_attempts: u32) -> Self {
        self.task_wait = Some(TaskWait { tasks, max_attempts });
        self
    }

    async fn dispatch(&self, request: Request) -> Result<Vec<u8>> {
        let response = self.api_client.send(request).await?.into_result()?;

        match &self.task_wait {
            Some(wait) if response.task_id.is_some() => {
                wait.tasks.resolve(response, wait.max_attempts).await
            },
            _ => Ok(response.data),
        }
    }
}

fn with_payload(request: Request, body: Vec<u8>, options: &Options) -> Request {
    let request = request.with_options(options.clone());
    if body.is_empty() {
        request
    } else {
        request.with_body(body)
    }
}

#[async_trait]
impl EntityService for EntityApi {
    async fn get(&self, id: &str, options: &Options) -> Result<Vec<u8>> {
        let request = Request::new(Method::Get, self.context.entity_endpoint(id))
            .with_options(options.clone());
        self.dispatch(request).await
    }

    async fn list(&self, options: &Options) -> Result<Vec<u8>> {
        let request = Request::new(Method::Get, self.context.collection_endpoint())
            .with_options(options.clone());
        self.dispatch(request).await
    }

    async fn create(&self, body: Vec<u8>, options: &Options) -> Result<Vec<u8>> {
        let request = Request::new(Method::Post, self.context.collection_endpoint());
        self.dispatch(with_payload(request, body, options)).await
    }

    async fn update(&self, id: &str, body: Vec<u8>, options: &Options) -> Result<Vec<u8>> {
        let request = Request::new(Method::Put, self.context.entity_endpoint(id));
        self.dispatch(with_payload(request, body, options)).await
    }

    async fn delete(&self, id: &str, body: Vec<u8>, options: &Options) -> Result<Vec<u8>> {
        let request = Request::new(Method::Delete, self.context.entity_endpoint(id));
        self.dispatch(with_payload(request, body, options)).await
    }

    async fn execute(
        &self,
        id: &str,
        operation: &str,
        body: Vec<u8>,
        options: &Options,
    ) -> Result<Vec<u8>> {
        tracing::info!(
            "execute: entity={}, id={}, operation={}",
            self.context.entity_type,
            id,
            operation
        );
        let request = Request::new(Method::Post, self.context.operation_endpoint(id, operation));
        self.dispatch(with_payload(request, body, options)).await
    }
}
