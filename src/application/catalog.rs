// Catalogs built once per run from the registration directory
use crate::domain::error::{RegistrationError, Result};
use crate::domain::graph::GraphRecord;
use crate::domain::meta::MetaData;
use crate::domain::registration::{CheckMeta, RegistrationRecord};
use crate::domain::template::{ArtifactKind, ArtifactName, ResourceType, Template, TemplateDocument};
use crate::infrastructure::artifact_store::RegistrationDirectory;
use serde_json::Value;

/// Every `template-*.json` in the directory, fail-fast on the first bad file
pub async fn list_templates(dir: &RegistrationDirectory) -> Result<Vec<Template>> {
    let mut templates = Vec::new();

    for name in dir.list(ArtifactKind::Template, None).await? {
        let document: TemplateDocument = dir.read_json(&name).await?;
        templates.push(Template {
            path: dir.path(&name),
            name,
            document,
        });
    }

    Ok(templates)
}

/// Summaries of every registered graph, in file name order
pub async fn load_graphs(dir: &RegistrationDirectory) -> Result<Vec<GraphRecord>> {
    let mut graphs = Vec::new();

    for name in dir
        .list(ArtifactKind::Registration, Some(&ResourceType::Graph))
        .await?
    {
        tracing::debug!("Extracting meta data from {}", name.file_name());
        let record = load_registration(dir, &name).await?;
        graphs.push(GraphRecord::from_registration(name.key(), &record));
    }

    if graphs.is_empty() {
        return Err(RegistrationError::Configuration(
            "Unable to load meta data for graphs, no registered graphs found".to_string(),
        ));
    }

    Ok(graphs)
}

pub async fn load_registration(
    dir: &RegistrationDirectory,
    name: &ArtifactName,
) -> Result<RegistrationRecord> {
    let value: Value = dir.read_json(name).await?;
    RegistrationRecord::from_response(value).map_err(|e| {
        RegistrationError::Configuration(format!("{}: {}", name.file_name(), e))
    })
}

/// Identity of the host's system check, from `registration-check-system.json`
pub async fn load_check_meta(dir: &RegistrationDirectory) -> Result<CheckMeta> {
    let path = dir.root().join("registration-check-system.json");
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        RegistrationError::Configuration(format!(
            "Unable to load check meta data from {}: {}",
            path.display(),
            e
        ))
    })?;

    let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
        RegistrationError::Configuration(format!("Unable to load check meta data: {e}"))
    })?;

    let record = RegistrationRecord::from_response(value)?;
    CheckMeta::from_registration(&record)
}

/// Binding hints for a dashboard; empty when no meta file exists
pub async fn load_meta(dir: &RegistrationDirectory, template: &ArtifactName) -> Result<MetaData> {
    let name = template.with_kind(ArtifactKind::Meta);
    Ok(dir.read_optional(&name).await?.unwrap_or_default())
}
