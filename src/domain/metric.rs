// Metric catalog - metrics currently exposed by the collection agent
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Separator between a metric group and the metric name within it
pub const METRIC_SEPARATOR: char = '`';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricCatalog {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl MetricCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the agent's snapshot document `{group: {metric: value}}`.
    /// Top-level entries that are not objects are flat metrics with no members.
    pub fn from_snapshot(snapshot: &Value) -> Self {
        let mut catalog = Self::new();
        if let Some(groups) = snapshot.as_object() {
            for (group, metrics) in groups {
                catalog.groups.entry(group.clone()).or_default();
                for metric in metrics.as_object().into_iter().flat_map(|m| m.keys()) {
                    catalog.insert(group.as_str(), metric.as_str());
                }
            }
        }
        catalog
    }

    pub fn insert(&mut self, group: impl Into<String>, metric: impl Into<String>) {
        self.groups
            .entry(group.into())
            .or_default()
            .insert(metric.into());
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn metric_count(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }

    /// Resolve a `group`metric` reference. A reference without a separator
    /// (or with an empty group) is looked up as a top-level key.
    pub fn contains(&self, reference: &str) -> bool {
        match reference.split_once(METRIC_SEPARATOR) {
            Some((group, name)) if !group.is_empty() => self
                .groups
                .get(group)
                .is_some_and(|members| members.contains(name)),
            _ => self.groups.contains_key(reference),
        }
    }
}
