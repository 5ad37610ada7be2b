//! Transport layer for the HCI API
//!
//! - [`request`] - request/response values and JSON envelope decoding
//! - [`http`] - [`HciClient`], the reqwest-backed [`ApiClient`]
//!
//! # Example
//!
//! ```ignore
//! use hci_client::api::{ApiClient, HciClient, Method, Request};
//! use hci_client::config::ClientConfig;
//!
//! async fn example() -> hci_client::Result<()> {
//!     let client = HciClient::new(&ClientConfig::new("https://api.example.com/v1", "key"))?;
//!     let response = client.send(Request::new(Method::Get, "tasks/1234")).await?;
//!     println!("{}", response.status_code);
//!     Ok(())
//! }
//! ```

pub mod http;
pub mod request;

#[cfg(test)]
pub(crate) mod mock;

use crate::error::Result;
use async_trait::async_trait;

pub use http::{HciClient, API_KEY_HEADER};
pub use request::{Method, Options, Request, Response};

/// Sends one request and decodes the answer.
///
/// `Err` means no usable response was received (transport failure or a body
/// that is not a JSON envelope). Application errors come back as `Ok` with a
/// non-empty [`Response::errors`]; interpreting them is the caller's job.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}
