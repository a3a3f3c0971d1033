//! Tool invoker backed by the knowledge-base HTTP API.
//!
//! Known operations map to dedicated routes; anything else goes through the
//! generic tool endpoint, so new server-side operations work without engine
//! changes. Every call produces the server's tool result envelope:
//! `{success: true, data, execution_time_ms, tool_name}` on success, or
//! `{success: false, error, execution_time_ms, tool_name}` when the request
//! fails or the server answers non-2xx. Failures are envelopes, never
//! [`ToolError`]s: the run records them as semantic failures in `results`
//! and keeps scheduling, instead of treating a flaky backend as a node
//! error that blocks later batches.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::ToolError;
use crate::traits::ToolInvoker;

pub struct HttpToolInvoker {
    client: reqwest::Client,
    base_url: String,
}

impl HttpToolInvoker {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a preconfigured client (timeouts, proxies, headers).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn route(&self, operation: &str) -> (reqwest::Method, String) {
        match operation {
            "get_facts_count" => (
                reqwest::Method::GET,
                format!("{}/api/facts/count", self.base_url),
            ),
            "search_knowledge" => (reqwest::Method::GET, format!("{}/api/search", self.base_url)),
            "add_fact" => (reqwest::Method::POST, format!("{}/api/facts", self.base_url)),
            other => (
                reqwest::Method::POST,
                format!("{}/api/tools/{other}", self.base_url),
            ),
        }
    }

    /// One request/response round trip, before enveloping. The error string
    /// becomes the envelope's `error` field.
    async fn call(&self, operation: &str, params: &Value) -> Result<Value, String> {
        let (method, url) = self.route(operation);

        let mut request = self.client.request(method.clone(), &url);
        if method == reqwest::Method::GET {
            if let Value::Object(map) = params {
                let query: Vec<(String, String)> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), query_value(v)))
                    .collect();
                request = request.query(&query);
            }
        } else {
            request = request.json(params);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;

        if !status.is_success() {
            return Err(format!("HTTP {status} from {operation}"));
        }

        // Non-JSON bodies come back as a plain string value.
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ToolInvoker for HttpToolInvoker {
    async fn invoke(&self, operation: &str, params: &Value) -> Result<Value, ToolError> {
        let started = std::time::Instant::now();
        let outcome = self.call(operation, params).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(match outcome {
            Ok(data) => json!({
                "success": true,
                "data": data,
                "execution_time_ms": elapsed_ms,
                "tool_name": operation,
            }),
            Err(error) => json!({
                "success": false,
                "error": error,
                "execution_time_ms": elapsed_ms,
                "tool_name": operation,
            }),
        })
    }
}
