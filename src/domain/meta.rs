// Host-specific binding hints for one dashboard instance
use serde::Deserialize;
use serde_json::{Map, Value};

/// Maps a dashboard widget tag onto a system graph registered for this host.
///
/// `{dashboard_tag: "database:file_system_space", metric_group: "fs",
/// metric_item: "_", graph_instance: null}` points widgets tagged
/// `database:file_system_space` at `registration-graph-fs-0-_.json`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SysGraph {
    pub dashboard_tag: String,
    pub metric_group: String,
    #[serde(default)]
    pub metric_item: Option<String>,
    #[serde(default)]
    pub graph_instance: Option<u64>,
}

impl SysGraph {
    /// Instance name of the graph this entry refers to
    pub fn instance_name(&self) -> String {
        format!(
            "{}-{}-{}",
            self.metric_group,
            self.graph_instance.unwrap_or(0),
            self.metric_item.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MetaData {
    #[serde(default)]
    pub sys_graphs: Vec<SysGraph>,
    #[serde(default)]
    pub vars: Map<String, Value>,
}

impl MetaData {
    /// Instance names of every graph mapped to `tag`
    pub fn graph_instances_for<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = String> + 'a {
        self.sys_graphs
            .iter()
            .filter(move |sg| sg.dashboard_tag == tag)
            .map(SysGraph::instance_name)
    }
}
