//! Typed resource services
//!
//! Each service wraps an [`EntityService`](crate::services::EntityService)
//! scoped to one entity type and maps its JSON payloads to a typed model.
//! Named actions simply pass a fixed operation to `execute`.

pub mod baremetal;
pub mod load_balancer_rule;

#[cfg(test)]
pub(crate) mod mock;

pub use baremetal::{Baremetal, BaremetalService};
pub use load_balancer_rule::{LoadBalancerRule, LoadBalancerRuleService};

use crate::error::Result;
use serde::de::DeserializeOwned;

/// Parse an entity payload
pub(crate) fn parse<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(data)?)
}

/// Parse a list payload; an empty body means an empty list
pub(crate) fn parse_list<T: DeserializeOwned>(data: &[u8]) -> Result<Vec<T>> {
    if data.trim_ascii().is_empty() {
        return Ok(Vec::new());
    }
    parse(data)
}

/// `Ok(false)` for "not found", the error unchanged otherwise
pub(crate) fn exists_from(result: Result<Vec<u8>>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}
