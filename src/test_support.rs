// Test doubles and fixtures shared by the unit tests
use crate::application::metric_source::MetricSource;
use crate::application::platform_api::{ApiResponse, PlatformApi};
use crate::domain::error::{RegistrationError, Result};
use crate::domain::metric::MetricCatalog;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Replays canned responses in order and records every call
#[derive(Default)]
pub struct RecordingApi {
    responses: Mutex<VecDeque<ApiResponse>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(ApiResponse::new(status, body));
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str, path: &str, query: &[(&str, &str)], body: Option<&Value>) -> Result<ApiResponse> {
        self.calls.lock().unwrap().push(ApiCall {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.cloned(),
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RegistrationError::Transport(format!("no response queued for {method} {path}")))
    }
}

#[async_trait]
impl PlatformApi for RecordingApi {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse> {
        self.record("GET", path, query, None)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.record("POST", path, &[], Some(body))
    }

    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.record("PUT", path, &[], Some(body))
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.record("DELETE", path, &[], None)
    }
}

pub struct StaticMetrics(pub MetricCatalog);

#[async_trait]
impl MetricSource for StaticMetrics {
    async fn load(&self) -> Result<MetricCatalog> {
        Ok(self.0.clone())
    }
}

pub fn write_file(dir: &Path, name: &str, value: Value) {
    std::fs::write(dir.join(name), serde_json::to_vec_pretty(&value).unwrap()).unwrap();
}

pub fn write_graph_registration(dir: &Path, key: &str, cid: &str, tags: &[&str]) {
    write_file(
        dir,
        &format!("registration-graph-{key}.json"),
        json!({"_cid": cid, "title": key, "tags": tags}),
    );
}

pub fn write_check_registration(dir: &Path) {
    write_file(
        dir,
        "registration-check-system.json",
        json!({"_cid": "/check_bundle/1001", "_check_uuids": ["check-uuid-1"]}),
    );
}

pub fn widget(kind: &str, id: &str, settings: Value) -> Value {
    json!({
        "active": true, "height": 1, "width": 2, "name": kind, "origin": "a0",
        "type": kind, "widget_id": id, "settings": settings
    })
}

pub fn graph_widget(id: &str, tags: &[&str]) -> Value {
    let mut w = widget("graph", id, json!({"graph_id": null, "account_id": null, "label": "${dashboard_instance} ops"}));
    w["tags"] = json!(tags);
    w
}

pub fn gauge_widget(id: &str, metric: &str) -> Value {
    widget("gauge", id, json!({"metric_name": metric, "check_uuid": null, "account_id": null}))
}

pub fn dashboard_config(title: &str, widgets: Vec<Value>) -> Value {
    json!({
        "title": title,
        "grid_layout": {"width": 12, "height": 4},
        "widgets": widgets
    })
}

/// The example postgres dashboard: one graph widget, one gauge widget
pub fn write_postgres_template(dir: &Path) {
    write_file(
        dir,
        "template-dashboard-postgres-db1.json",
        json!({
            "type": "dashboard",
            "id": "postgres",
            "description": "PostgreSQL database",
            "config": dashboard_config("postgres ${dashboard_instance}", vec![
                graph_widget("w1", &["database:iops"]),
                gauge_widget("w2", "fs`/`used_percent"),
            ])
        }),
    );
}
