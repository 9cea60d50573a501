// Dashboard working copy and widget model
use super::graph::{require_attributes, verify_identity};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetKind {
    Graph,
    Gauge,
    Forecast,
    Other(String),
}

/// One dashboard tile. Unknown fields are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Widget {
    #[serde(rename = "type")]
    pub widget_type: String,
    pub widget_id: Value,
    /// Match keys for graph widgets; never submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Widget {
    pub fn kind(&self) -> WidgetKind {
        match self.widget_type.as_str() {
            "graph" => WidgetKind::Graph,
            "gauge" => WidgetKind::Gauge,
            "forecast" => WidgetKind::Forecast,
            other => WidgetKind::Other(other.to_string()),
        }
    }

    /// Printable widget id (ids are strings or numbers depending on the template)
    pub fn id(&self) -> String {
        match &self.widget_id {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        }
    }

    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.settings.insert(key.to_string(), value.into());
    }

    fn is_set(&self, key: &str) -> bool {
        self.settings.get(key).is_some_and(|v| !v.is_null())
    }

    /// Whether the kind-specific remote reference has been filled in
    pub fn is_resolved(&self) -> bool {
        match self.kind() {
            WidgetKind::Graph => self.is_set("graph_id"),
            WidgetKind::Gauge => self.is_set("check_uuid") && self.is_set("metric_name"),
            WidgetKind::Forecast => !self.settings.contains_key("metrics"),
            WidgetKind::Other(_) => false,
        }
    }
}

/// Working copy of a dashboard template's `config`, mutated by binding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    pub title: String,
    pub widgets: Vec<Widget>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const DASHBOARD_ATTRIBUTES: &[&str] = &["grid_layout", "title", "widgets"];

const WIDGET_ATTRIBUTES: &[&str] = &[
    "active",
    "height",
    "name",
    "origin",
    "settings",
    "type",
    "widget_id",
    "width",
];

/// Every problem that would make the dashboard API reject this config
pub fn verify_dashboard(config: &Map<String, Value>, existing: bool) -> Vec<String> {
    let mut problems = Vec::new();

    verify_identity(config, existing, "dashboard", &mut problems);
    require_attributes(config, DASHBOARD_ATTRIBUTES, None, &mut problems);

    let widgets = config
        .get("widgets")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object);
    for widget in widgets {
        let id = widget
            .get("widget_id")
            .map(|id| id.as_str().map(str::to_string).unwrap_or_else(|| id.to_string()))
            .unwrap_or_else(|| "unnamed".to_string());
        let owner = format!("widget '{id}'");
        require_attributes(widget, WIDGET_ATTRIBUTES, Some(owner.as_str()), &mut problems);
    }

    problems
}
