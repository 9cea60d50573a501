// Graph summaries and create/update attribute verification
use super::registration::{REMOTE_ID_FIELD, RegistrationRecord};
use serde_json::{Map, Value};

/// A registered graph, as seen by the widget binder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRecord {
    pub instance_name: String,
    pub tags: Vec<String>,
    pub id: String,
}

impl GraphRecord {
    pub fn from_registration(instance_name: impl Into<String>, record: &RegistrationRecord) -> Self {
        Self {
            instance_name: instance_name.into(),
            tags: record.tags(),
            id: record.short_id().to_string(),
        }
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag))
    }
}

const GRAPH_ATTRIBUTES: &[&str] = &[
    "access_keys",
    "composites",
    "datapoints",
    "description",
    "guides",
    "line_style",
    "logarithmic_left_y",
    "logarithmic_right_y",
    "max_left_y",
    "max_right_y",
    "metric_clusters",
    "min_left_y",
    "min_right_y",
    "notes",
    "style",
    "tags",
    "title",
];

const COMPOSITE_ATTRIBUTES: &[&str] = &[
    "axis",
    "color",
    "data_formula",
    "hidden",
    "legend_formula",
    "name",
    "stack",
];

const DATAPOINT_ATTRIBUTES: &[&str] = &[
    "axis",
    "check_id",
    "color",
    "data_formula",
    "derive",
    "hidden",
    "legend_formula",
    "metric_name",
    "metric_type",
    "name",
    "stack",
    "alpha",
];

const GUIDE_ATTRIBUTES: &[&str] = &["color", "data_formula", "hidden", "legend_formula", "name"];

const METRIC_CLUSTER_ATTRIBUTES: &[&str] = &[
    "axis",
    "data_formula",
    "hidden",
    "legend_formula",
    "metric_cluster",
    "name",
    "stack",
    "aggregate_function",
];

/// `existing` decides whether the remote identity must be present (update)
/// or absent (create). Attribute values are not validated.
pub fn verify_identity(
    config: &Map<String, Value>,
    existing: bool,
    resource: &str,
    problems: &mut Vec<String>,
) {
    let has_id = config.contains_key(REMOTE_ID_FIELD);
    if existing && !has_id {
        problems.push(format!(
            "Missing attribute {REMOTE_ID_FIELD} required for existing {resource}"
        ));
    }
    if !existing && has_id {
        problems.push(format!("Invalid attribute {REMOTE_ID_FIELD} for new {resource}"));
    }
}

pub fn require_attributes(
    object: &Map<String, Value>,
    attributes: &[&str],
    owner: Option<&str>,
    problems: &mut Vec<String>,
) {
    for attr in attributes {
        if !object.contains_key(*attr) {
            match owner {
                Some(owner) => problems.push(format!("Missing attribute {owner} requires '{attr}'")),
                None => problems.push(format!("Missing attribute {attr}")),
            }
        }
    }
}

fn each_object<'a>(config: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Map<String, Value>> {
    config
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn label<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .unwrap_or("unnamed")
}

/// Every problem that would make the graph API reject this config
pub fn verify_graph(config: &Map<String, Value>, existing: bool) -> Vec<String> {
    let mut problems = Vec::new();

    verify_identity(config, existing, "graph", &mut problems);
    require_attributes(config, GRAPH_ATTRIBUTES, None, &mut problems);

    for datapoint in each_object(config, "datapoints") {
        let owner = format!("datapoint '{}'", label(datapoint, &["metric_name", "name"]));
        require_attributes(datapoint, DATAPOINT_ATTRIBUTES, Some(owner.as_str()), &mut problems);
        if datapoint.get("check_id").is_some_and(Value::is_null) {
            problems.push(format!("Invalid attribute value {owner} requires valid 'check_id'"));
        }
    }

    for composite in each_object(config, "composites") {
        let owner = format!("composite '{}'", label(composite, &["name"]));
        require_attributes(composite, COMPOSITE_ATTRIBUTES, Some(owner.as_str()), &mut problems);
    }

    for guide in each_object(config, "guides") {
        let owner = format!("guide '{}'", label(guide, &["name"]));
        require_attributes(guide, GUIDE_ATTRIBUTES, Some(owner.as_str()), &mut problems);
    }

    for cluster in each_object(config, "metric_clusters") {
        let owner = format!("metric cluster '{}'", label(cluster, &["name"]));
        require_attributes(cluster, METRIC_CLUSTER_ATTRIBUTES, Some(owner.as_str()), &mut problems);
    }

    problems
}
