// Resource synchronizer - idempotent create-or-adopt against the remote API
use crate::application::catalog::load_registration;
use crate::application::platform_api::PlatformApi;
use crate::domain::dashboard::verify_dashboard;
use crate::domain::error::{RegistrationError, Result};
use crate::domain::graph::verify_graph;
use crate::domain::registration::{REMOTE_ID_FIELD, RegistrationRecord};
use crate::domain::template::{ArtifactKind, ArtifactName, ResourceType};
use crate::infrastructure::artifact_store::RegistrationDirectory;
use serde_json::{Map, Value};
use std::sync::Arc;

/// How a resource came to be registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Registration artifact was already on disk, no remote call made
    AlreadyRegistered,
    /// Found remotely by natural key and adopted
    Adopted,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    AlreadyAbsent,
}

#[derive(Clone)]
pub struct ResourceSynchronizer {
    api: Arc<dyn PlatformApi>,
    dir: RegistrationDirectory,
}

impl ResourceSynchronizer {
    pub fn new(api: Arc<dyn PlatformApi>, dir: RegistrationDirectory) -> Self {
        Self { api, dir }
    }

    /// Make sure the resource described by a `config-*` artifact exists
    /// remotely and that its `registration-*` artifact is on disk.
    pub async fn create_or_adopt(
        &self,
        config_name: &ArtifactName,
    ) -> Result<(RegistrationRecord, SyncOutcome)> {
        let registration = config_name.with_kind(ArtifactKind::Registration);

        if self.dir.exists(&registration).await? {
            tracing::info!("Registration exists - using {}", registration.file_name());
            let record = load_registration(&self.dir, &registration).await?;
            return Ok((record, SyncOutcome::AlreadyRegistered));
        }

        let config: Map<String, Value> = self.dir.read_json(config_name).await?;
        let resource = &config_name.resource;

        let (record, outcome) = match self.find_existing(resource, &config).await? {
            Some(record) => (record, SyncOutcome::Adopted),
            None => (self.create(resource, &config).await?, SyncOutcome::Created),
        };

        tracing::info!("Saving registration {}", registration.file_name());
        self.dir.write_new(&registration, &record.to_value()).await?;

        Ok((record, outcome))
    }

    /// Replace an existing remote resource with the local config
    pub async fn update(&self, config_name: &ArtifactName) -> Result<RegistrationRecord> {
        let config: Map<String, Value> = self.dir.read_json(config_name).await?;
        verify(&config_name.resource, &config, true)?;

        let cid = config
            .get(REMOTE_ID_FIELD)
            .and_then(Value::as_str)
            .filter(|cid| !cid.is_empty())
            .ok_or_else(|| RegistrationError::Validation {
                resource: config_name.resource.to_string(),
                messages: vec![format!(
                    "Invalid attribute {REMOTE_ID_FIELD}, expected a non-empty string"
                )],
            })?
            .to_string();

        tracing::info!("Updating {} {}", config_name.resource, cid);
        let response = self.api.put(&cid, &Value::Object(config)).await?;
        if !response.is_ok() {
            return Err(RegistrationError::api(response.status, &response.body));
        }

        let record = RegistrationRecord::from_response(response.body)?;
        self.dir
            .replace(&config_name.with_kind(ArtifactKind::Registration), &record.to_value())
            .await?;
        Ok(record)
    }

    /// Delete a registered resource remotely. A resource the API no longer
    /// knows about counts as removed.
    pub async fn remove(&self, record: &RegistrationRecord) -> Result<RemoveOutcome> {
        let existing = self.api.get(record.cid(), &[]).await?;
        if existing.is_instance_not_found() {
            tracing::info!("{} not found", record.cid());
            return Ok(RemoveOutcome::AlreadyAbsent);
        }
        if !existing.is_success() {
            tracing::error!("API {} for {}: {}", existing.status, record.cid(), existing.body);
            return Err(RegistrationError::api(existing.status, &existing.body));
        }

        tracing::info!("Deleting {}", record.cid());
        let response = self.api.delete(record.cid()).await?;
        if !response.is_success() {
            tracing::error!("API {} for {}: {}", response.status, record.cid(), response.body);
            return Err(RegistrationError::api(response.status, &response.body));
        }

        Ok(RemoveOutcome::Removed)
    }

    /// Dashboards are matched by exact title; graphs have no natural key
    async fn find_existing(
        &self,
        resource: &ResourceType,
        config: &Map<String, Value>,
    ) -> Result<Option<RegistrationRecord>> {
        if *resource != ResourceType::Dashboard {
            return Ok(None);
        }

        let title = config
            .get("title")
            .and_then(Value::as_str)
            .filter(|title| !title.is_empty())
            .ok_or_else(|| RegistrationError::Configuration("Invalid dashboard title".to_string()))?;

        tracing::info!("Checking API for existing dashboard with title '{}'", title);
        let response = self.api.get("/dashboard", &[("f_title", title)]).await?;
        if !response.is_ok() {
            return Err(RegistrationError::api(response.status, &response.body));
        }

        let Value::Array(found) = response.body else {
            return Ok(None);
        };

        // The title filter is not an exact match, only adopt identical titles
        let total = found.len();
        let Some(exact) = found
            .into_iter()
            .find(|dashboard| dashboard.get("title").and_then(Value::as_str) == Some(title))
        else {
            if total > 0 {
                tracing::info!("{} dashboard(s) returned, none titled exactly '{}'", total, title);
            }
            return Ok(None);
        };

        tracing::info!("Found existing dashboard with title '{}'", title);
        Ok(Some(RegistrationRecord::from_response(exact)?))
    }

    async fn create(
        &self,
        resource: &ResourceType,
        config: &Map<String, Value>,
    ) -> Result<RegistrationRecord> {
        verify(resource, config, false)?;

        tracing::info!("Sending {} configuration to API", resource);
        let response = self
            .api
            .post(&format!("/{resource}"), &Value::Object(config.clone()))
            .await?;
        if !response.is_ok() {
            return Err(RegistrationError::api(response.status, &response.body));
        }

        RegistrationRecord::from_response(response.body)
    }
}

/// Attribute-presence check for a graph or dashboard config
pub fn verify(resource: &ResourceType, config: &Map<String, Value>, existing: bool) -> Result<()> {
    let problems = match resource {
        ResourceType::Graph => verify_graph(config, existing),
        ResourceType::Dashboard => verify_dashboard(config, existing),
        other => {
            return Err(RegistrationError::Configuration(format!(
                "unsupported resource type {other}"
            )));
        }
    };

    if problems.is_empty() {
        return Ok(());
    }

    for problem in &problems {
        tracing::error!("{}", problem);
    }
    Err(RegistrationError::Validation {
        resource: resource.to_string(),
        messages: problems,
    })
}
