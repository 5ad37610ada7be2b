//! Client for the HCI provisioning API
//!
//! Most API operations are asynchronous: the call returns a task id and the
//! caller polls `tasks/<id>` until the operation finishes. The crate is
//! layered accordingly:
//!
//! - [`api`] - HTTP transport and JSON envelope decoding
//! - [`services`] - resource-agnostic entity calls and task polling
//! - [`resources`] - typed wrappers for individual entity types
//! - [`config`] - client configuration
//! - [`error`] - error types
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hci_client::api::HciClient;
//! use hci_client::config::ClientConfig;
//! use hci_client::resources::BaremetalService;
//! use hci_client::services::{TaskApi, TaskService};
//!
//! async fn example() -> hci_client::Result<()> {
//!     let config = ClientConfig::load()?;
//!     let client = Arc::new(HciClient::new(&config)?);
//!
//!     let servers = BaremetalService::new(client.clone(), "compute-east", "production");
//!     servers.reboot("bm-1234").await?;
//!
//!     let tasks = TaskApi::from_config(client, &config);
//!     let result = tasks.poll("task-5678", config.max_attempts).await?;
//!     println!("{}", String::from_utf8_lossy(&result));
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod resources;
pub mod services;

pub use error::{Error, Result};
