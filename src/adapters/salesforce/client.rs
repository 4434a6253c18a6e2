use crate::adapters::salesforce::auth::Session;
use crate::domain::model::UserRecord;
use crate::domain::ports::UserGateway;
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const USER_SOBJECT_PATH: &str = "/services/data/v50.0/sobjects/User";
pub const COMPOSITE_PATH: &str = "/services/data/v52.0/composite";

#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Raw(String),
}

/// Per-call overrides for [`SalesforceRestClient::send_request`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub url: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn json<T: Serialize>(body: &T) -> Result<Self> {
        Ok(Self {
            body: Some(RequestBody::Json(serde_json::to_value(body)?)),
            ..Default::default()
        })
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub url: String,
    pub body: String,
}

impl ApiResponse {
    pub fn json(&self) -> Value {
        parse_json_body(&self.body)
    }
}

/// Body as JSON, or a wrapper object carrying the raw text when it is not JSON.
pub fn parse_json_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| {
        json!({
            "message": "response.json() failed",
            "response": text,
        })
    })
}

/// Renders `[{"errorCode": "...", "message": "..."}]` as `CODE: message`
/// entries joined with `; `; other bodies are returned as they are.
pub fn describe_error_body(text: &str) -> String {
    let Ok(Value::Array(errors)) = serde_json::from_str::<Value>(text) else {
        return text.to_string();
    };

    let described: Vec<String> = errors
        .iter()
        .filter_map(|e| {
            let message = e.get("message")?.as_str()?;
            Some(match e.get("errorCode").and_then(Value::as_str) {
                Some(code) => format!("{}: {}", code, message),
                None => message.to_string(),
            })
        })
        .collect();

    if described.is_empty() {
        text.to_string()
    } else {
        described.join("; ")
    }
}

fn masked(headers: &BTreeMap<String, String>) -> BTreeMap<&str, &str> {
    headers
        .iter()
        .map(|(k, v)| {
            if k.eq_ignore_ascii_case("authorization") {
                (k.as_str(), "Bearer ****")
            } else {
                (k.as_str(), v.as_str())
            }
        })
        .collect()
}

/// REST client bound to one resource path of the org.
#[derive(Debug, Clone)]
pub struct SalesforceRestClient {
    client: Client,
    base_url: String,
    url: String,
    base_headers: BTreeMap<String, String>,
    timeout: Duration,
}

impl SalesforceRestClient {
    pub fn new(
        base_url: &str,
        path: &str,
        session: &Session,
        additional_headers: Option<BTreeMap<String, String>>,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let url = format!("{}/{}", base_url, path.trim_start_matches('/'));

        let mut base_headers = BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "*/*".to_string()),
        ]);
        base_headers.extend(session.headers());
        if let Some(additional) = additional_headers {
            base_headers.extend(additional);
        }

        Self {
            client: Client::new(),
            base_url,
            url,
            base_headers,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn base_headers(&self) -> &BTreeMap<String, String> {
        &self.base_headers
    }

    pub async fn send_request(&self, method: Method, options: RequestOptions) -> Result<ApiResponse> {
        let url = options.url.unwrap_or_else(|| self.url.clone());
        let timeout = options.timeout.unwrap_or(self.timeout);

        let mut headers = self.base_headers.clone();
        headers.extend(options.headers);

        tracing::info!(
            method = %method,
            url = %url,
            timeout_secs = timeout.as_secs_f64(),
            headers = ?masked(&headers),
            "Salesforce REST API request"
        );

        let mut request = self.client.request(method, &url).timeout(timeout);
        for (key, value) in &headers {
            request = request.header(key, value);
        }
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        request = match options.body {
            Some(RequestBody::Json(value)) => request.body(serde_json::to_vec(&value)?),
            Some(RequestBody::Raw(text)) => request.body(text),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            tracing::error!("Error occurred for Salesforce REST API request to {}: {}", url, e);
            ImportError::ApiError(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Salesforce response status: {}", status);

        if !status.is_success() {
            tracing::error!("Salesforce REST API request to {} returned {}", url, status);
            return Err(ImportError::ApiStatusError {
                status: status.as_u16(),
                url,
                body: describe_error_body(&body),
            });
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            url,
            body,
        })
    }

    pub async fn get(&self, options: RequestOptions) -> Result<ApiResponse> {
        self.send_request(Method::GET, options).await
    }

    pub async fn post(&self, options: RequestOptions) -> Result<ApiResponse> {
        self.send_request(Method::POST, options).await
    }

    pub async fn patch(&self, options: RequestOptions) -> Result<ApiResponse> {
        self.send_request(Method::PATCH, options).await
    }

    /// Sends several sub-requests in one call through the Composite API.
    pub async fn composite_request(&self, composite_data: &Value) -> Result<ApiResponse> {
        let request_data = serde_json::to_string(composite_data)?;
        let options = RequestOptions {
            url: Some(format!("{}{}", self.base_url, COMPOSITE_PATH)),
            body: Some(RequestBody::Raw(request_data.clone())),
            ..Default::default()
        }
        .header("Content-Length", request_data.len().to_string());

        self.post(options).await
    }
}

#[async_trait]
impl UserGateway for SalesforceRestClient {
    async fn create_user(&self, user: &UserRecord) -> Result<String> {
        let response = self.post(RequestOptions::json(user)?).await?;
        let body = response.json();

        match body.get("id").and_then(Value::as_str) {
            Some(id) => Ok(id.to_string()),
            None => Err(ImportError::processing(format!(
                "create response has no id: {}",
                body
            ))),
        }
    }
}
