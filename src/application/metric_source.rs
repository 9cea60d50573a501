// Metric snapshot trait - what the collection agent currently exposes
use crate::domain::error::Result;
use crate::domain::metric::MetricCatalog;
use async_trait::async_trait;

#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Load the grouped metric names for this host
    async fn load(&self) -> Result<MetricCatalog>;
}
