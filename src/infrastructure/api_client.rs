// HTTP implementation of the platform API
use crate::application::platform_api::{ApiResponse, PlatformApi};
use crate::domain::error::{RegistrationError, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    key: String,
    app: String,
}

impl ApiClient {
    pub fn new(base_url: String, key: String, app: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
            app,
        }
    }

    /// Paths are remote identities (`/graph/123`) or collections (`/graph`)
    fn build_url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        for (idx, (key, value)) in query.iter().enumerate() {
            let sep = if idx == 0 { '?' } else { '&' };
            url.push(sep);
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Circonus-Auth-Token", &self.key)
            .header("X-Circonus-App-Name", &self.app)
            .header("Accept", "application/json")
    }

    async fn execute(&self, method: Method, url: String, body: Option<&Value>) -> Result<ApiResponse> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RegistrationError::Transport(format!("{method} {url}: {e}")))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| RegistrationError::Transport(format!("{method} {url}: {e}")))?;

        // error pages are not always JSON; keep them as raw text
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ApiResponse::new(status, body))
    }
}

#[async_trait]
impl PlatformApi for ApiClient {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse> {
        self.execute(Method::GET, self.build_url(path, query), None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.execute(Method::POST, self.build_url(path, &[]), Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.execute(Method::PUT, self.build_url(path, &[]), Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.execute(Method::DELETE, self.build_url(path, &[]), None).await
    }
}
