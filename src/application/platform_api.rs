// Remote API trait - the observability platform's REST surface
use crate::domain::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Status and decoded body of one API call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Create, update and read succeed only on exactly 200
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Any 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 404 carrying the platform's "instance not found" code
    pub fn is_instance_not_found(&self) -> bool {
        self.status == 404
            && self.body.get("code").and_then(Value::as_str) == Some("ObjectError.InstanceNotFound")
    }
}

/// Transport errors are returned as `Err`; any HTTP status, success or not,
/// comes back as an `ApiResponse` for the caller to judge.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse>;

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse>;

    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse>;

    async fn delete(&self, path: &str) -> Result<ApiResponse>;
}
