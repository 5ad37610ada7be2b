//! Generic services shared by every resource type
//!
//! - [`entity`] - CRUD and named actions over raw JSON payloads
//! - [`task`] - fetching and polling asynchronous tasks

pub mod entity;
pub mod task;

pub use entity::{EntityApi, EntityContext, EntityService};
pub use task::{Sleeper, Task, TaskApi, TaskService, TaskStatus, TokioSleeper};
