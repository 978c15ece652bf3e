//! HTTP client for the provider APIs behind the weather and movie tools

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::ServerError;
use capability_core::protocol::ToolCallResult;

/// JSON GET client bound to one provider base URL
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("capability-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Absolute URL for a provider path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET `path` with `query` and decode the JSON body.
    ///
    /// Non-success statuses become [`ServerError::Upstream`] carrying the
    /// provider's response text.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ServerError> {
        let url = self.endpoint(path);
        debug!("GET {}", url);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Request to {} failed with status {}: {}", path, status, body);
            return Err(ServerError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Report provider rejections as an error result the caller can read,
/// and everything else as a handler failure.
pub fn upstream_result(
    result: Result<ToolCallResult, ServerError>,
) -> anyhow::Result<ToolCallResult> {
    match result {
        Ok(result) => Ok(result),
        Err(e @ ServerError::Upstream { .. }) => Ok(ToolCallResult::error(e.to_string())),
        Err(e) => Err(e.into()),
    }
}
