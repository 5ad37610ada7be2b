//! Task Service
//!
//! Asynchronous API operations hand back a task id. [`TaskApi`] fetches
//! `tasks/<id>` and polls it at a fixed interval until the task succeeds,
//! fails, or the attempt budget is spent.

use crate::api::{ApiClient, Method, Request, Response};
use crate::config::ClientConfig;
use crate::error::{ApiErrorResponse, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const TASKS_ENDPOINT: &str = "tasks";

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_FAILED: &str = "FAILED";

/// Task status as reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Success,
    Failed,
    /// Anything outside the known vocabulary. Polled like `Pending`.
    Unknown(String),
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            STATUS_PENDING => TaskStatus::Pending,
            STATUS_SUCCESS => TaskStatus::Success,
            STATUS_FAILED => TaskStatus::Failed,
            other => TaskStatus::Unknown(other.to_string()),
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::parse(s),
            other => TaskStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => STATUS_PENDING,
            TaskStatus::Success => STATUS_SUCCESS,
            TaskStatus::Failed => STATUS_FAILED,
            TaskStatus::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a server-side task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    pub created: String,
    /// Raw JSON result, only present once the task succeeded
    pub result: Option<Vec<u8>>,
}

#[derive(Deserialize)]
struct TaskPayload {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: Value,
    #[serde(default)]
    created: String,
    #[serde(default)]
    result: Option<Box<RawValue>>,
}

impl Task {
    /// Parse the `data` payload of a `tasks/<id>` response
    pub fn from_data(data: &[u8]) -> Result<Self> {
        let payload: TaskPayload = serde_json::from_slice(data)?;
        Ok(Self {
            id: payload.id,
            status: TaskStatus::from_value(&payload.status),
            created: payload.created,
            result: payload.result.map(|raw| raw.get().as_bytes().to_vec()),
        })
    }

    /// Creation time, accepting RFC 3339 timestamps or plain dates
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.created) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(&self.created, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

/// Where a single fetch leaves the poll loop
enum PollState {
    Pending,
    Succeeded(Vec<u8>),
    Failed { status: String, result: Option<Vec<u8>> },
}

impl From<Task> for PollState {
    fn from(task: Task) -> Self {
        match task.status {
            TaskStatus::Success => PollState::Succeeded(task.result.unwrap_or_default()),
            TaskStatus::Failed => PollState::Failed {
                status: task.status.to_string(),
                result: task.result,
            },
            TaskStatus::Pending => PollState::Pending,
            TaskStatus::Unknown(raw) => {
                tracing::warn!("Task {} has unrecognized status {}, treating as pending", task.id, raw);
                PollState::Pending
            },
        }
    }
}

/// Pause between two polls. Injected so tests run without real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
pub trait TaskService: Send + Sync {
    /// Fetch one snapshot of a task
    async fn get(&self, task_id: &str) -> Result<Task>;

    /// Poll until the task is terminal; returns the result bytes on success
    async fn poll(&self, task_id: &str, max_attempts: u32) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct TaskApi {
    api_client: Arc<dyn ApiClient>,
    sleeper: Arc<dyn Sleeper>,
    poll_interval: Duration,
}

impl TaskApi {
    pub fn new(api_client: Arc<dyn ApiClient>, poll_interval: Duration) -> Self {
        Self {
            api_client,
            sleeper: Arc::new(TokioSleeper),
            poll_interval,
        }
    }

    pub fn from_config(api_client: Arc<dyn ApiClient>, config: &ClientConfig) -> Self {
        Self::new(api_client, config.poll_interval)
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    async fn fetch(&self, task_id: &str) -> Result<Task> {
        let endpoint = format!("{}/{}", TASKS_ENDPOINT, urlencoding::encode(task_id));
        let request = Request::new(Method::Get, endpoint);
        let response = self.api_client.send(request).await?;

        if response.is_error() {
            return Err(ApiErrorResponse::new(response.status_code, response.errors).into());
        }

        if response.status_code >= 400 {
            // An error-class answer without an error set: the task failed if
            // we can still read it, otherwise report the bare status.
            if response.data.is_empty() {
                return Err(ApiErrorResponse::new(response.status_code, Vec::new()).into());
            }
            let mut task = Task::from_data(&response.data)?;
            tracing::debug!(
                "Task {} fetched with HTTP {} (status {}), treating as failed",
                task_id,
                response.status_code,
                task.status
            );
            task.status = TaskStatus::Failed;
            return Ok(task);
        }

        if response.data.is_empty() {
            tracing::warn!("Task {} fetched without data, polling it as pending", task_id);
            return Ok(Task {
                id: task_id.to_string(),
                status: TaskStatus::Unknown(String::new()),
                created: String::new(),
                result: None,
            });
        }

        Task::from_data(&response.data)
    }

    /// Like [`TaskService::poll`], but stops early when `cancel` fires.
    ///
    /// Cancellation interrupts an in-flight fetch or the sleep between two
    /// fetches and yields [`Error::Cancelled`].
    pub async fn poll_until_cancelled(
        &self,
        task_id: &str,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let cancelled = || Error::Cancelled {
            task_id: task_id.to_string(),
        };

        let mut attempt: u32 = 0;
        loop {
            let task = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                task = self.fetch(task_id) => task?,
            };

            match PollState::from(task) {
                PollState::Succeeded(result) => {
                    tracing::info!("Task {} succeeded after {} pending polls", task_id, attempt);
                    return Ok(result);
                },
                PollState::Failed { status, result } => {
                    tracing::info!("Task {} failed with status {}", task_id, status);
                    return Err(Error::TaskFailed {
                        task_id: task_id.to_string(),
                        status,
                        result,
                    });
                },
                PollState::Pending => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        tracing::warn!("Task {} still pending after {} attempts", task_id, attempt);
                        return Err(Error::PollTimeout {
                            task_id: task_id.to_string(),
                            attempts: attempt,
                        });
                    }
                    tracing::debug!(
                        "Task {} pending (attempt {}/{}), sleeping {:?}",
                        task_id,
                        attempt,
                        max_attempts,
                        self.poll_interval
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(cancelled()),
                        _ = self.sleeper.sleep(self.poll_interval) => {},
                    }
                },
            }
        }
    }

    /// Poll several tasks concurrently. Results come back in input order.
    pub async fn poll_many(&self, task_ids: &[String], max_attempts: u32) -> Vec<Result<Vec<u8>>> {
        futures::future::join_all(task_ids.iter().map(|id| self.poll(id, max_attempts))).await
    }

    /// Finish the operation a response started.
    ///
    /// Responses without a task id are already complete and return their
    /// data. A task reported as done in the envelope is not fetched again.
    pub async fn resolve(&self, response: Response, max_attempts: u32) -> Result<Vec<u8>> {
        let response = response.into_result()?;

        let Some(task_id) = response.task_id.clone() else {
            return Ok(response.data);
        };

        match response.task_status.as_deref().map(TaskStatus::parse) {
            Some(TaskStatus::Success) => Ok(response.data),
            Some(TaskStatus::Failed) => Err(Error::TaskFailed {
                task_id,
                status: STATUS_FAILED.to_string(),
                result: (!response.data.is_empty()).then_some(response.data),
            }),
            _ => self.poll(&task_id, max_attempts).await,
        }
    }
}

#[async_trait]
impl TaskService for TaskApi {
    async fn get(&self, task_id: &str) -> Result<Task> {
        self.fetch(task_id).await
    }

    async fn poll(&self, task_id: &str, max_attempts: u32) -> Result<Vec<u8>> {
        self.poll_until_cancelled(task_id, max_attempts, &CancellationToken::new())
            .await
    }
}
