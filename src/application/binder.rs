// Widget binder - resolves dashboard widgets to graphs and metrics
use crate::application::interpolation::{Context, expand, expand_value};
use crate::domain::dashboard::{DashboardConfig, Widget, WidgetKind};
use crate::domain::error::{BindingWarning, RegistrationError, Result};
use crate::domain::graph::GraphRecord;
use crate::domain::meta::MetaData;
use crate::domain::metric::MetricCatalog;
use crate::domain::registration::CheckMeta;
use serde_json::{Map, Value, json};

/// Base interpolation context for one dashboard instance.
///
/// Later sources win: host vars, account/check identity, the instance name,
/// then the dashboard's meta vars.
pub fn dashboard_context(
    host_vars: &Map<String, Value>,
    account_id: &str,
    check: &CheckMeta,
    instance: &str,
    meta: &MetaData,
) -> Context {
    let mut context = host_vars.clone();
    context.insert("account_id".to_string(), json!(account_id));
    context.insert("check_id".to_string(), json!(check.check_id));
    context.insert("check_uuid".to_string(), json!(check.check_uuid));
    context.insert("dashboard_instance".to_string(), json!(instance));
    for (key, value) in &meta.vars {
        context.insert(key.clone(), value.clone());
    }
    context
}

pub struct WidgetBinder<'a> {
    graphs: &'a [GraphRecord],
    metrics: &'a MetricCatalog,
    account_id: &'a str,
    check: &'a CheckMeta,
}

impl<'a> WidgetBinder<'a> {
    pub fn new(
        graphs: &'a [GraphRecord],
        metrics: &'a MetricCatalog,
        account_id: &'a str,
        check: &'a CheckMeta,
    ) -> Self {
        Self {
            graphs,
            metrics,
            account_id,
            check,
        }
    }

    /// Bind every widget in place, dropping the ones that cannot be resolved.
    ///
    /// Widgets are visited from last to first so removal never shifts an
    /// unvisited widget. Warnings are returned in template order.
    pub fn bind(
        &self,
        dashboard: &str,
        config: &mut DashboardConfig,
        meta: &MetaData,
        context: &Context,
    ) -> Result<Vec<BindingWarning>> {
        config.title = expand(&config.title, context);

        let mut warnings = Vec::new();
        for idx in (0..config.widgets.len()).rev() {
            let widget = &mut config.widgets[idx];
            let bound = match widget.kind() {
                WidgetKind::Graph => self.bind_graph(widget, meta, context),
                WidgetKind::Gauge => self.bind_gauge(widget, context),
                WidgetKind::Forecast => self.bind_forecast(widget, context),
                WidgetKind::Other(kind) => Err(BindingWarning::new(
                    widget.id(),
                    format!("unsupported widget type ({kind})"),
                )),
            };

            if let Err(warning) = bound {
                tracing::warn!("{}, removing widget from dashboard {}", warning, dashboard);
                config.widgets.remove(idx);
                warnings.push(warning);
            }
        }
        warnings.reverse();
        debug_assert!(config.widgets.iter().all(Widget::is_resolved));

        if config.widgets.is_empty() {
            tracing::error!(
                "No applicable widgets were configured with available metrics/graphs for {}",
                dashboard
            );
            return Err(RegistrationError::NoWidgetsConfigured {
                dashboard: dashboard.to_string(),
            });
        }

        Ok(warnings)
    }

    /// First graph in catalog order sharing a tag with the widget, directly
    /// or through a meta `sys_graphs` mapping
    pub fn find_graph(&self, tags: &[String], meta: &MetaData) -> Option<&'a GraphRecord> {
        self.graphs.iter().find(|graph| {
            graph.has_any_tag(tags)
                || tags.iter().any(|tag| {
                    meta.graph_instances_for(tag)
                        .any(|instance| instance == graph.instance_name)
                })
        })
    }

    fn bind_graph(
        &self,
        widget: &mut Widget,
        meta: &MetaData,
        context: &Context,
    ) -> std::result::Result<(), BindingWarning> {
        let tags = widget.tags.clone().unwrap_or_default();
        let graph = self.find_graph(&tags, meta).ok_or_else(|| {
            BindingWarning::new(widget.id(), format!("no graph found with tag(s) {tags:?}"))
        })?;

        tracing::debug!("Widget {} bound to graph {}", widget.id(), graph.instance_name);
        widget.set("account_id", self.account_id);
        widget.set("graph_id", graph.id.as_str());
        if let Some(label) = widget.settings.get_mut("label") {
            expand_value(label, context);
        }
        // match keys only, the API does not accept them
        widget.tags = None;
        Ok(())
    }

    fn bind_gauge(&self, widget: &mut Widget, context: &Context) -> std::result::Result<(), BindingWarning> {
        let template = widget
            .setting_str("metric_name")
            .ok_or_else(|| BindingWarning::new(widget.id(), "no metric_name setting"))?;
        let metric_name = expand(template, context);

        if !self.metrics.contains(&metric_name) {
            return Err(BindingWarning::new(
                widget.id(),
                format!("no metric found matching {metric_name}"),
            ));
        }

        widget.set("metric_name", metric_name);
        widget.set("account_id", self.account_id);
        widget.set("check_uuid", self.check.check_uuid.as_str());
        Ok(())
    }

    fn bind_forecast(&self, widget: &mut Widget, context: &Context) -> std::result::Result<(), BindingWarning> {
        let references: Vec<String> = match widget.settings.get("metrics") {
            Some(Value::Array(items)) if !items.is_empty() => items
                .iter()
                .map(|item| item.as_str().map(|s| expand(s, context)).unwrap_or_default())
                .collect(),
            Some(Value::Array(_)) => {
                return Err(BindingWarning::new(widget.id(), "0 metrics defined"));
            }
            _ => return Err(BindingWarning::new(widget.id(), "no metrics attribute")),
        };

        let forecast_metrics: Vec<Value> = references
            .iter()
            .filter(|name| self.metrics.contains(name))
            .map(|name| json!({"check_uuid": self.check.check_uuid, "metric_name": name}))
            .collect();

        if forecast_metrics.len() != references.len() {
            return Err(BindingWarning::new(
                widget.id(),
                format!(
                    "metric count error, only found {} of {}",
                    forecast_metrics.len(),
                    references.len()
                ),
            ));
        }

        let mut forecast_context = context.clone();
        forecast_context.insert("forecast_metrics".to_string(), Value::Array(forecast_metrics));

        if let Some(title) = widget.settings.get_mut("title") {
            expand_value(title, context);
        }
        for key in ["resource_limit", "resource_usage"] {
            if let Some(expr) = widget.settings.get_mut(key) {
                expand_value(expr, &forecast_context);
            }
        }
        widget.settings.remove("metrics");

        tracing::debug!("Configured forecast widget {}", widget.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dashboard_config, gauge_widget, graph_widget, widget};

    fn check() -> CheckMeta {
        CheckMeta {
            check_id: "1001".to_string(),
            check_uuid: "check-uuid-1".to_string(),
        }
    }

    fn graph(instance: &str, id: &str, tags: &[&str]) -> GraphRecord {
        GraphRecord {
            instance_name: instance.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            id: id.to_string(),
        }
    }

    fn metrics() -> MetricCatalog {
        let mut catalog = MetricCatalog::new();
        catalog.insert("fs", "/`used_percent");
        catalog.insert("fs", "/data`used_percent");
        catalog.insert("postgres", "db1`size");
        catalog
    }

    fn config(widgets: Vec<Value>) -> DashboardConfig {
        serde_json::from_value(dashboard_config("postgres ${dashboard_instance}", widgets)).unwrap()
    }

    fn context(meta: &MetaData) -> Context {
        let vars = json!({"host_name": "db-01"}).as_object().cloned().unwrap();
        dashboard_context(&vars, "42", &check(), "db1", meta)
    }

    fn forecast_widget(metrics: Value) -> Value {
        widget("forecast", "w3", json!({
            "title": "${dashboard_instance} disk",
            "metrics": metrics,
            "resource_limit": "100",
            "resource_usage": "metric:average(\"${forecast_metrics.0.check_uuid}\", \"${forecast_metrics.0.metric_name}\")"
        }))
    }

    #[test]
    fn test_context_precedence() {
        let meta: MetaData = serde_json::from_value(json!({"vars": {"host_name": "override", "db": "main"}})).unwrap();
        let ctx = context(&meta);
        assert_eq!(ctx["host_name"], json!("override"));
        assert_eq!(ctx["db"], json!("main"));
        assert_eq!(ctx["dashboard_instance"], json!("db1"));
        assert_eq!(ctx["check_uuid"], json!("check-uuid-1"));
        assert_eq!(ctx["account_id"], json!("42"));
    }

    #[test]
    fn test_binds_graph_and_gauge() {
        let graphs = vec![graph("postgres-0-iops", "g-1", &["database:iops", "postgres"])];
        let metrics = metrics();
        let check = check();
        let binder = WidgetBinder::new(&graphs, &metrics, "42", &check);
        let meta = MetaData::default();
        let mut cfg = config(vec![
            graph_widget("w1", &["database:iops"]),
            gauge_widget("w2", "fs`/`used_percent"),
        ]);

        let warnings = binder.bind("postgres-db1", &mut cfg, &meta, &context(&meta)).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(cfg.title, "postgres db1");
        assert_eq!(cfg.widgets.len(), 2);

        let graph_w = &cfg.widgets[0];
        assert_eq!(graph_w.settings["graph_id"], json!("g-1"));
        assert_eq!(graph_w.settings["account_id"], json!("42"));
        assert_eq!(graph_w.settings["label"], json!("db1 ops"));
        assert!(graph_w.tags.is_none());

        let gauge_w = &cfg.widgets[1];
        assert_eq!(gauge_w.settings["metric_name"], json!("fs`/`used_percent"));
        assert_eq!(gauge_w.settings["check_uuid"], json!("check-uuid-1"));
        assert!(cfg.widgets.iter().all(Widget::is_resolved));
    }

    #[test]
    fn test_unresolved_widgets_removed_with_warnings() {
        let graphs = vec![graph("postgres-0-iops", "g-1", &["database:iops"])];
        let metrics = MetricCatalog::new();
        let check = check();
        let binder = WidgetBinder::new(&graphs, &metrics, "42", &check);
        let meta = MetaData::default();
        let mut cfg = config(vec![
            gauge_widget("w0", "fs`/`used_percent"),
            graph_widget("w1", &["database:iops"]),
            graph_widget("w2", &["database:locks"]),
            widget("html", "w3", json!({})),
        ]);

        let warnings = binder.bind("postgres-db1", &mut cfg, &meta, &context(&meta)).unwrap();
        let ids: Vec<&str> = warnings.iter().map(|w| w.widget_id.as_str()).collect();
        assert_eq!(ids, vec!["w0", "w2", "w3"]);
        assert!(warnings[0].reason.contains("fs`/`used_percent"));
        assert!(warnings[2].reason.contains("unsupported"));

        assert_eq!(cfg.widgets.len(), 1);
        assert_eq!(cfg.widgets[0].id(), "w1");
    }

    #[test]
    fn test_first_graph_in_catalog_order_wins() {
        let graphs = vec![
            graph("a-0-", "first", &["shared"]),
            graph("b-0-", "second", &["shared", "exact"]),
        ];
        let metrics = MetricCatalog::new();
        let check = check();
        let binder = WidgetBinder::new(&graphs, &metrics, "42", &check);
        let meta = MetaData::default();

        let tags = vec!["exact".to_string(), "shared".to_string()];
        assert_eq!(binder.find_graph(&tags, &meta).unwrap().id, "first");
        assert_eq!(binder.find_graph(&["exact".to_string()], &meta).unwrap().id, "second");
        assert!(binder.find_graph(&[], &meta).is_none());
    }

    #[test]
    fn test_sys_graph_mapping() {
        let graphs = vec![
            graph("cpu-0-", "cpu", &["cpu"]),
            graph("fs-0-_data", "fs-data", &["fs"]),
        ];
        let metrics = MetricCatalog::new();
        let check = check();
        let binder = WidgetBinder::new(&graphs, &metrics, "42", &check);
        let meta: MetaData = serde_json::from_value(json!({
            "sys_graphs": [{
                "dashboard_tag": "database:file_system_space",
                "metric_group": "fs",
                "metric_item": "_data",
                "graph_instance": null
            }]
        }))
        .unwrap();

        let mut cfg = config(vec![graph_widget("w1", &["database:file_system_space"])]);
        binder.bind("postgres-db1", &mut cfg, &meta, &context(&meta)).unwrap();
        assert_eq!(cfg.widgets[0].settings["graph_id"], json!("fs-data"));
    }

    #[test]
    fn test_forecast_binding() {
        let graphs: Vec<GraphRecord> = Vec::new();
        let metrics = metrics();
        let check = check();
        let binder = WidgetBinder::new(&graphs, &metrics, "42", &check);
        let meta = MetaData::default();
        let base = context(&meta);

        let mut cfg = config(vec![forecast_widget(json!(["fs`/`used_percent", "fs`/data`used_percent"]))]);
        binder.bind("postgres-db1", &mut cfg, &meta, &base).unwrap();

        let settings = &cfg.widgets[0].settings;
        assert!(!settings.contains_key("metrics"));
        assert_eq!(settings["title"], json!("db1 disk"));
        assert_eq!(
            settings["resource_usage"],
            json!("metric:average(\"check-uuid-1\", \"fs`/`used_percent\")")
        );
        assert!(cfg.widgets[0].is_resolved());
        assert!(!base.contains_key("forecast_metrics"));
    }

    #[test]
    fn test_forecast_partial_resolution_drops_widget() {
        let graphs = vec![graph("postgres-0-iops", "g-1", &["database:iops"])];
        let metrics = metrics();
        let check = check();
        let binder = WidgetBinder::new(&graphs, &metrics, "42", &check);
        let meta = MetaData::default();

        let mut cfg = config(vec![
            graph_widget("w1", &["database:iops"]),
            forecast_widget(json!(["fs`/`used_percent", "fs`/missing`used_percent"])),
            forecast_widget(json!([])),
        ]);
        let warnings = binder.bind("postgres-db1", &mut cfg, &meta, &context(&meta)).unwrap();

        assert_eq!(cfg.widgets.len(), 1);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].reason.contains("only found 1 of 2"));
        assert!(warnings[1].reason.contains("0 metrics"));
    }

    #[test]
    fn test_all_widgets_pruned() {
        let graphs = vec![graph("cpu-0-", "cpu", &["cpu"])];
        let metrics = MetricCatalog::new();
        let check = check();
        let binder = WidgetBinder::new(&graphs, &metrics, "42", &check);
        let meta = MetaData::default();
        let mut cfg = config(vec![
            graph_widget("w1", &["database:iops"]),
            gauge_widget("w2", "fs`/`used_percent"),
        ]);

        let err = binder.bind("postgres-db1", &mut cfg, &meta, &context(&meta)).unwrap_err();
        assert!(matches!(err, RegistrationError::NoWidgetsConfigured { ref dashboard } if dashboard == "postgres-db1"));
    }
}
