//! HTTP transport for DLP REST calls
//!
//! Every RPC is described by a [`RestCall`] and executed by a [`Transport`].
//! [`GcpHttpClient`] is the reqwest-based implementation used in production.

use std::fmt;
use std::future::Future;

use reqwest::{Client, Method};
use serde_json::Value;

use super::auth::GcpCredentials;
use crate::error::{DlpError, Result};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..end],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpVerb {
    fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method().as_str())
    }
}

/// One unary REST call: verb, path relative to the endpoint, query
/// parameters (a JSON object) and an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct RestCall {
    pub verb: HttpVerb,
    pub path: String,
    pub query: Value,
    pub body: Option<Value>,
}

impl RestCall {
    pub fn get(path: impl Into<String>, query: Value) -> Self {
        Self {
            verb: HttpVerb::Get,
            path: path.into(),
            query,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            verb: HttpVerb::Post,
            path: path.into(),
            query: Value::Null,
            body: Some(body),
        }
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self {
            verb: HttpVerb::Patch,
            path: path.into(),
            query: Value::Null,
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            verb: HttpVerb::Delete,
            path: path.into(),
            query: Value::Null,
            body: None,
        }
    }

    /// Path plus encoded query string
    pub fn path_and_query(&self) -> String {
        add_query_params(&self.path, &self.query)
    }
}

/// Executes unary calls. Implementations own connection handling and
/// authentication; they must not retry on their caller's behalf unless
/// configured to.
pub trait Transport: Send + Sync {
    fn unary(&self, call: RestCall) -> impl Future<Output = Result<Value>> + Send;
}

/// Percent-encode each segment of a resource name, keeping the separators
pub fn encode_resource_name(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Append a JSON object's scalar fields (and arrays of scalars) as query
/// parameters. Nulls are skipped.
fn add_query_params(path: &str, params: &Value) -> String {
    let Value::Object(map) = params else {
        return path.to_string();
    };

    let mut query_parts: Vec<String> = Vec::new();

    for (key, value) in map {
        let values = match value {
            Value::Array(arr) => arr.iter().collect::<Vec<_>>(),
            other => vec![other],
        };

        for value in values {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            query_parts.push(format!("{}={}", key, urlencoding::encode(&text)));
        }
    }

    if query_parts.is_empty() {
        path.to_string()
    } else if path.contains('?') {
        format!("{}&{}", path, query_parts.join("&"))
    } else {
        format!("{}?{}", path, query_parts.join("&"))
    }
}

/// HTTP client wrapper for DLP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
    credentials: GcpCredentials,
    endpoint: String,
}

impl GcpHttpClient {
    pub fn new(credentials: GcpCredentials, endpoint: &str, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| DlpError::transport(None, format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, call: &RestCall) -> String {
        format!("{}/{}", self.endpoint, call.path_and_query())
    }

    async fn execute(&self, call: RestCall) -> Result<Value> {
        let url = self.url_for(&call);
        tracing::debug!("{} {}", call.verb, url);

        let token = self.credentials.get_token().await?;

        let mut request = self
            .client
            .request(call.verb.method(), &url)
            .bearer_auth(token);
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DlpError::transport(None, format!("failed to send request: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                DlpError::transport(
                    Some(status.as_u16()),
                    format!("failed to read response body: {e}"),
                )
            })?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            let canonical = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["status"].as_str().map(str::to_string));
            let message = match canonical {
                Some(code) => format!("API request failed: {} {}", status, code),
                None => format!("API request failed: {}", status),
            };
            return Err(DlpError::transport(Some(status.as_u16()), message));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            DlpError::transport(
                Some(status.as_u16()),
                format!("failed to parse response JSON: {e}"),
            )
        })
    }
}

impl Transport for GcpHttpClient {
    fn unary(&self, call: RestCall) -> impl Future<Output = Result<Value>> + Send {
        self.execute(call)
    }
}
