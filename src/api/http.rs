//! HTTP transport for HCI API calls

use super::request::{Request, Response};
use super::ApiClient;
use crate::config::ClientConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "MC-Api-Key";

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let truncated = if text.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| text.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &text[..cut], text.len())
    } else {
        text.into_owned()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// reqwest-backed [`ApiClient`]
///
/// Holds only the base endpoint, the credential and reqwest's connection
/// pool, so one instance can be cloned and shared between concurrent callers.
#[derive(Clone)]
pub struct HciClient {
    client: Client,
    base_endpoint: String,
    api_key: String,
}

impl HciClient {
    /// Create a client from a configuration with an endpoint and key set
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate_transport()?;

        let client = Client::builder()
            .user_agent(concat!("hci-client/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self::with_http_client(client, &config.base_endpoint, &config.api_key))
    }

    /// Create a client around an existing reqwest client
    pub fn with_http_client(client: Client, base_endpoint: &str, api_key: &str) -> Self {
        Self {
            client,
            base_endpoint: base_endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Full URL for a request, options appended as query parameters
    pub fn url_for(&self, request: &Request) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.base_endpoint,
            request.endpoint.trim_start_matches('/')
        ))?;

        if !request.options.is_empty() {
            url.query_pairs_mut().extend_pairs(request.options.iter());
        }

        Ok(url)
    }
}

#[async_trait]
impl ApiClient for HciClient {
    async fn send(&self, request: Request) -> Result<Response> {
        let url = self.url_for(&request)?;
        tracing::debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.into(), url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json");

        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        let decoded = Response::from_body(status, &body);
        match &decoded {
            Ok(resp) if resp.is_error() => {
                // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
                tracing::warn!(
                    "API error: {} {} -> {} - {}",
                    request.method,
                    request.endpoint,
                    status,
                    sanitize_for_log(&body)
                );
            },
            Ok(_) => {
                tracing::debug!("{} {} -> {}", request.method, request.endpoint, status);
            },
            Err(e) => {
                tracing::warn!(
                    "Undecodable response: {} {} -> {} ({}) - {}",
                    request.method,
                    request.endpoint,
                    status,
                    e,
                    sanitize_for_log(&body)
                );
            },
        }

        decoded
    }
}
