// Metric snapshot sources - local collection agent or a saved snapshot file
use crate::application::metric_source::MetricSource;
use crate::domain::error::{RegistrationError, Result};
use crate::domain::metric::MetricCatalog;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

/// Queries the agent's inventory endpoint (`{group: {metric: value}}`)
#[derive(Debug, Clone)]
pub struct AgentMetricSource {
    url: String,
}

impl AgentMetricSource {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

#[async_trait]
impl MetricSource for AgentMetricSource {
    async fn load(&self) -> Result<MetricCatalog> {
        let response = reqwest::get(&self.url)
            .await
            .map_err(|e| RegistrationError::Transport(format!("agent {}: {}", self.url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RegistrationError::Transport(format!(
                "agent {} returned status {}: {}",
                self.url, status, body
            )));
        }

        let snapshot = response
            .json::<Value>()
            .await
            .map_err(|e| RegistrationError::Transport(format!("agent {}: {}", self.url, e)))?;

        Ok(MetricCatalog::from_snapshot(&snapshot))
    }
}

/// Reads a previously captured agent snapshot
#[derive(Debug, Clone)]
pub struct FileMetricSource {
    path: PathBuf,
}

impl FileMetricSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl MetricSource for FileMetricSource {
    async fn load(&self) -> Result<MetricCatalog> {
        let bytes = tokio::fs::read(&self.path).await?;
        let snapshot: Value = serde_json::from_slice(&bytes).map_err(|e| {
            RegistrationError::Configuration(format!(
                "unable to parse metric snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(MetricCatalog::from_snapshot(&snapshot))
    }
}
