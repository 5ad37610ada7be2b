//! Request and response values

use crate::error::{ApiErrorDetail, ApiErrorResponse, Error, Result};
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Query parameters, passed through untouched
pub type Options = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Path relative to the base endpoint
    pub endpoint: String,
    pub body: Option<Vec<u8>>,
    pub options: Options,
}

impl Request {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            options: Options::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}

/// A decoded server answer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    pub status_code: u16,
    /// Set when the call started an asynchronous operation
    pub task_id: Option<String>,
    pub task_status: Option<String>,
    /// Raw JSON of the `data` field, exactly as sent (object or list)
    pub data: Vec<u8>,
    pub errors: Vec<ApiErrorDetail>,
    pub metadata: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    task_status: Option<String>,
    #[serde(default)]
    data: Option<Box<RawValue>>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
    #[serde(default)]
    errors: Option<Vec<ApiErrorDetail>>,
}

impl Response {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn with_errors(mut self, errors: Vec<ApiErrorDetail>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_task(mut self, task_id: impl Into<String>, task_status: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self.task_status = Some(task_status.into());
        self
    }

    /// Decode a response body.
    ///
    /// Accepts an empty body, a `{data, metadata, errors, taskId, taskStatus}`
    /// envelope, or a bare JSON list (kept as `data`). Anything else is an
    /// envelope error.
    pub fn from_body(status_code: u16, body: &[u8]) -> Result<Self> {
        let mut response = Self::new(status_code);

        let trimmed = body.trim_ascii();
        if trimmed.is_empty() {
            return Ok(response);
        }

        let envelope_error = |source| Error::Envelope {
            status: status_code,
            source,
        };

        match trimmed[0] {
            b'{' => {
                let envelope: Envelope = serde_json::from_slice(trimmed).map_err(envelope_error)?;
                response.task_id = envelope.task_id;
                response.task_status = envelope.task_status;
                response.data = envelope
                    .data
                    .map(|raw| raw.get().as_bytes().to_vec())
                    .unwrap_or_default();
                response.metadata = envelope.metadata.unwrap_or_default();
                response.errors = envelope.errors.unwrap_or_default();
            },
            b'[' => {
                let raw: Box<RawValue> = serde_json::from_slice(trimmed).map_err(envelope_error)?;
                response.data = raw.get().as_bytes().to_vec();
            },
            _ => {
                // Still validate so the error carries serde's position info.
                let value: Value = serde_json::from_slice(trimmed).map_err(envelope_error)?;
                if !value.is_null() {
                    return Err(envelope_error(<serde_json::Error as serde::de::Error>::custom(format!(
                        "expected a JSON object or list, got {}",
                        json_kind(&value)
                    ))));
                }
            },
        }

        Ok(response)
    }

    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Turn a failed response into [`Error::Api`].
    ///
    /// The error set decides first; an error-class status without one (an
    /// empty 404, say) still fails, with an empty set.
    pub fn into_result(self) -> Result<Self> {
        if self.is_error() || self.status_code >= 400 {
            return Err(ApiErrorResponse::new(self.status_code, self.errors).into());
        }
        Ok(self)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_object_envelope() {
        let body = br#"{"taskId": "test_task_id", "taskStatus": "test_task_status", "data": {"key":"value"}, "metadata": {"meta_key":"meta_value"}}"#;
        let response = Response::from_body(200, body).unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.task_id.as_deref(), Some("test_task_id"));
        assert_eq!(response.task_status.as_deref(), Some("test_task_status"));
        assert_eq!(response.data, br#"{"key":"value"}"#.to_vec());
        assert_eq!(response.metadata["meta_key"], "meta_value");
        assert!(!response.is_error());
    }

    #[test]
    fn test_decode_list_under_data() {
        let body = br#"{"data": [{"id":"a"},{"id":"b"}]}"#;
        let response = Response::from_body(200, body).unwrap();
        assert_eq!(response.data, br#"[{"id":"a"},{"id":"b"}]"#.to_vec());
    }

    #[test]
    fn test_decode_bare_list() {
        let response = Response::from_body(200, b" [1, 2] \n").unwrap();
        assert_eq!(response.data, b"[1, 2]".to_vec());
    }

    #[test]
    fn test_decode_error_envelope() {
        let body = br#"{"errors": [{"errorCode": "FOO_ERROR", "message": "message1"}, {"errorCode": "BAR_ERROR", "message":"message2"}]}"#;
        let response = Response::from_body(400, body).unwrap();

        assert_eq!(response.status_code, 400);
        assert!(response.data.is_empty());
        assert_eq!(response.errors.len(), 2);
        assert_eq!(response.errors[0].error_code, "FOO_ERROR");
        assert_eq!(response.errors[1].message, "message2");

        match response.into_result() {
            Err(Error::Api(api)) => {
                assert_eq!(api.status_code, 400);
                assert_eq!(api.error_codes(), vec!["FOO_ERROR", "BAR_ERROR"]);
            },
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_is_an_empty_response() {
        let response = Response::from_body(404, b"").unwrap();
        assert_eq!(response, Response::new(404));

        let err = response.into_result().unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.api_errors().map(|e| e.len()), Some(0));

        assert!(Response::from_body(204, b"").unwrap().into_result().is_ok());
    }

    #[test]
    fn test_malformed_body_is_envelope_error() {
        match Response::from_body(502, b"<html>Bad Gateway</html>") {
            Err(Error::Envelope { status, .. }) => assert_eq!(status, 502),
            other => panic!("expected envelope error, got {:?}", other),
        }
        assert!(matches!(
            Response::from_body(200, b"\"just a string\""),
            Err(Error::Envelope { .. })
        ));
        assert!(matches!(
            Response::from_body(200, br#"{"data": {"unterminated": "#),
            Err(Error::Envelope { .. })
        ));
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(reqwest::Method::from(Method::Delete), reqwest::Method::DELETE);
        assert_eq!(Method::Put.to_string(), "PUT");
    }
}
