// Template model and the registration directory naming contract
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Remote resource kind encoded in an artifact file name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Check,
    Graph,
    Dashboard,
    Other(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Check => "check",
            ResourceType::Graph => "graph",
            ResourceType::Dashboard => "dashboard",
            ResourceType::Other(name) => name,
        }
    }

    fn parse(name: &str) -> Self {
        match name {
            "check" => ResourceType::Check,
            "graph" => ResourceType::Graph,
            "dashboard" => ResourceType::Dashboard,
            other => ResourceType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of an artifact within the registration directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Template,
    Meta,
    Config,
    Registration,
}

impl ArtifactKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ArtifactKind::Template => "template",
            ArtifactKind::Meta => "meta",
            ArtifactKind::Config => "config",
            ArtifactKind::Registration => "registration",
        }
    }

    fn parse(prefix: &str) -> Option<Self> {
        match prefix {
            "template" => Some(ArtifactKind::Template),
            "meta" => Some(ArtifactKind::Meta),
            "config" => Some(ArtifactKind::Config),
            "registration" => Some(ArtifactKind::Registration),
            _ => None,
        }
    }
}

/// Parsed `<kind>-<type>-<id>-<instance>.json` file name.
///
/// `type` and `id` never contain a dash; everything after the id is the
/// instance name, dashes included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName {
    pub kind: ArtifactKind,
    pub resource: ResourceType,
    pub id: String,
    pub instance: String,
}

impl ArtifactName {
    pub fn new(
        kind: ArtifactKind,
        resource: ResourceType,
        id: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            resource,
            id: id.into(),
            instance: instance.into(),
        }
    }

    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(".json")?;
        let mut parts = stem.splitn(4, '-');
        let kind = ArtifactKind::parse(parts.next()?)?;
        let resource = parts.next().filter(|s| !s.is_empty())?;
        let id = parts.next().filter(|s| !s.is_empty())?;
        let instance = parts.next().filter(|s| !s.is_empty())?;

        Some(Self::new(kind, ResourceType::parse(resource), id, instance))
    }

    /// `<id>-<instance>`, the identity shared by every artifact of one resource
    pub fn key(&self) -> String {
        format!("{}-{}", self.id, self.instance)
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}.json",
            self.kind.prefix(),
            self.resource,
            self.key()
        )
    }

    /// Same resource, different artifact role
    pub fn with_kind(&self, kind: ArtifactKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.resource, self.key())
    }
}

/// On-disk template document
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDocument {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub config: Value,
}

/// A shipped resource blueprint, read-only for the run
#[derive(Debug, Clone)]
pub struct Template {
    pub name: ArtifactName,
    pub path: PathBuf,
    pub document: TemplateDocument,
}

impl Template {
    pub fn resource(&self) -> &ResourceType {
        &self.name.resource
    }

    pub fn instance(&self) -> &str {
        &self.name.instance
    }

    pub fn config(&self) -> &Value {
        &self.document.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_artifact_name() {
        let name = ArtifactName::parse("template-dashboard-postgres-db1.json").unwrap();
        assert_eq!(name.kind, ArtifactKind::Template);
        assert_eq!(name.resource, ResourceType::Dashboard);
        assert_eq!(name.id, "postgres");
        assert_eq!(name.instance, "db1");
        assert_eq!(name.key(), "postgres-db1");
    }

    #[test]
    fn test_instance_keeps_dashes() {
        let name = ArtifactName::parse("registration-graph-fs-0-_var_lib.json").unwrap();
        assert_eq!(name.resource, ResourceType::Graph);
        assert_eq!(name.id, "fs");
        assert_eq!(name.instance, "0-_var_lib");
        assert_eq!(name.file_name(), "registration-graph-fs-0-_var_lib.json");
    }

    #[test]
    fn test_rejects_other_names() {
        assert!(ArtifactName::parse("template-dashboard-postgres.json").is_none());
        assert!(ArtifactName::parse("template-dashboard-postgres-db1.yaml").is_none());
        assert!(ArtifactName::parse("backup-dashboard-postgres-db1.json").is_none());
        assert!(ArtifactName::parse("README.md").is_none());
    }

    #[test]
    fn test_with_kind() {
        let template = ArtifactName::parse("template-dashboard-postgres-db1.json").unwrap();
        assert_eq!(
            template.with_kind(ArtifactKind::Config).file_name(),
            "config-dashboard-postgres-db1.json"
        );
        assert_eq!(
            template.with_kind(ArtifactKind::Registration).file_name(),
            "registration-dashboard-postgres-db1.json"
        );
    }
}
