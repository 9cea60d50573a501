// Registration pipeline - stage sequencing with abort-on-first-error
use crate::application::binder::{WidgetBinder, dashboard_context};
use crate::application::catalog::{
    list_templates, load_check_meta, load_graphs, load_meta, load_registration,
};
use crate::application::metric_source::MetricSource;
use crate::application::platform_api::PlatformApi;
use crate::application::synchronizer::{RemoveOutcome, ResourceSynchronizer, SyncOutcome};
use crate::domain::dashboard::DashboardConfig;
use crate::domain::error::{BindingWarning, RegistrationError, Result};
use crate::domain::registration::{CheckMeta, RegistrationRecord};
use crate::domain::template::{ArtifactKind, ArtifactName, ResourceType, Template};
use crate::infrastructure::artifact_store::RegistrationDirectory;
use crate::infrastructure::config::Settings;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Pipeline stages, in the only order they can complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    GraphsRegistered,
    ChecksLoaded,
    TemplatesFound,
    MetricsLoaded,
    GraphsLoaded,
    DashboardsConfigured,
    DashboardsCreated,
    Finalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::GraphsRegistered => "graphs-registered",
            Stage::ChecksLoaded => "checks-loaded",
            Stage::TemplatesFound => "templates-found",
            Stage::MetricsLoaded => "metrics-loaded",
            Stage::GraphsLoaded => "graphs-loaded",
            Stage::DashboardsConfigured => "dashboards-configured",
            Stage::DashboardsCreated => "dashboards-created",
            Stage::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// What a completed run did
#[derive(Debug, Default)]
pub struct RunReport {
    pub stages: Vec<Stage>,
    pub graphs: Vec<(String, SyncOutcome)>,
    pub configured: Vec<String>,
    pub already_configured: Vec<String>,
    pub dashboards: Vec<(String, SyncOutcome)>,
    pub warnings: Vec<BindingWarning>,
}

impl RunReport {
    fn complete(&mut self, stage: Stage) {
        tracing::info!("Stage {} complete", stage);
        self.stages.push(stage);
    }

    pub fn created(&self) -> usize {
        self.graphs
            .iter()
            .chain(&self.dashboards)
            .filter(|(_, outcome)| *outcome == SyncOutcome::Created)
            .count()
    }
}

pub struct RegistrationPipeline {
    dir: RegistrationDirectory,
    account_id: String,
    ui_url: String,
    host_vars: Map<String, Value>,
    metrics: Arc<dyn MetricSource>,
    sync: ResourceSynchronizer,
}

impl RegistrationPipeline {
    pub fn new(
        settings: &Settings,
        api: Arc<dyn PlatformApi>,
        metrics: Arc<dyn MetricSource>,
    ) -> Self {
        let dir = RegistrationDirectory::new(settings.registration.directory.clone());
        Self {
            sync: ResourceSynchronizer::new(api, dir.clone()),
            dir,
            account_id: settings.account.account_id.clone(),
            ui_url: settings.account.ui_url.trim_end_matches('/').to_string(),
            host_vars: settings.vars.clone(),
            metrics,
        }
    }

    /// Run every stage in order; the first error ends the run
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();

        self.register_graphs(&mut report).await?;
        report.complete(Stage::GraphsRegistered);

        tracing::info!("Loading check meta data");
        let check = load_check_meta(&self.dir).await?;
        report.complete(Stage::ChecksLoaded);

        let templates = self.find_templates().await?;
        report.complete(Stage::TemplatesFound);

        if templates.is_empty() {
            tracing::warn!("No dashboard templates found, skipping dashboards");
            report.complete(Stage::Finalized);
            return Ok(report);
        }

        let metrics = self.metrics.load().await?;
        tracing::info!(
            "Loaded {} metrics in {} groups",
            metrics.metric_count(),
            metrics.group_count()
        );
        if metrics.is_empty() {
            tracing::warn!("Metric catalog is empty, gauge and forecast widgets will be dropped");
        }
        report.complete(Stage::MetricsLoaded);

        let graphs = load_graphs(&self.dir).await?;
        tracing::info!("Loaded meta data from {} graphs", graphs.len());
        report.complete(Stage::GraphsLoaded);

        let binder = WidgetBinder::new(&graphs, &metrics, &self.account_id, &check);
        let mut queue: VecDeque<Template> = templates.into();
        while let Some(template) = queue.pop_front() {
            self.configure_dashboard(&template, &binder, &check, &mut report)
                .await?;
        }
        report.complete(Stage::DashboardsConfigured);

        let mut queue: VecDeque<ArtifactName> = self
            .dir
            .list(ArtifactKind::Config, Some(&ResourceType::Dashboard))
            .await?
            .into();
        while let Some(config_name) = queue.pop_front() {
            self.create_dashboard(&config_name, &mut report).await?;
        }
        report.complete(Stage::DashboardsCreated);

        report.complete(Stage::Finalized);
        Ok(report)
    }

    /// Remove every registered dashboard, then every registered graph
    pub async fn deregister(&self) -> Result<Vec<(String, RemoveOutcome)>> {
        let mut removed = Vec::new();

        for resource in [ResourceType::Dashboard, ResourceType::Graph] {
            let mut queue: VecDeque<ArtifactName> = self
                .dir
                .list(ArtifactKind::Registration, Some(&resource))
                .await?
                .into();

            while let Some(name) = queue.pop_front() {
                let record = load_registration(&self.dir, &name).await?;
                let outcome = self.sync.remove(&record).await?;

                self.dir.remove(&name).await?;
                self.dir.remove(&name.with_kind(ArtifactKind::Config)).await?;
                tracing::info!("Removed {} ({:?})", name, outcome);
                removed.push((name.to_string(), outcome));
            }
        }

        Ok(removed)
    }

    /// Push a `config-*` artifact that already carries its remote identity
    pub async fn update(&self, file_name: &str) -> Result<RegistrationRecord> {
        let name = ArtifactName::parse(file_name)
            .filter(|name| name.kind == ArtifactKind::Config)
            .ok_or_else(|| {
                RegistrationError::Configuration(format!(
                    "'{file_name}' is not a config-<type>-<id>-<instance>.json artifact"
                ))
            })?;
        self.sync.update(&name).await
    }

    async fn register_graphs(&self, report: &mut RunReport) -> Result<()> {
        let mut queue: VecDeque<ArtifactName> = self
            .dir
            .list(ArtifactKind::Config, Some(&ResourceType::Graph))
            .await?
            .into();

        while let Some(config_name) = queue.pop_front() {
            tracing::info!("Creating graph {}", config_name.file_name());
            let (record, outcome) = self.sync.create_or_adopt(&config_name).await?;
            tracing::info!("Graph {} {:?}", record.cid(), outcome);
            report.graphs.push((config_name.to_string(), outcome));
        }

        Ok(())
    }

    async fn find_templates(&self) -> Result<Vec<Template>> {
        tracing::info!("Identifying dashboard templates");

        let templates: Vec<Template> = list_templates(&self.dir)
            .await?
            .into_iter()
            .filter(|t| *t.resource() == ResourceType::Dashboard)
            .collect();

        for template in &templates {
            tracing::info!(
                "Found {}-{} {} {}",
                template.document.resource_type,
                template.document.id,
                template.path.display(),
                template.document.description.as_deref().unwrap_or("")
            );
        }
        tracing::info!("Loaded {} template(s)", templates.len());
        Ok(templates)
    }

    async fn configure_dashboard(
        &self,
        template: &Template,
        binder: &WidgetBinder<'_>,
        check: &CheckMeta,
        report: &mut RunReport,
    ) -> Result<()> {
        let dashboard = template.name.key();
        let config_name = template.name.with_kind(ArtifactKind::Config);
        tracing::info!("Configuring dashboard {} ({})", dashboard, template.path.display());

        if self.dir.exists(&config_name).await? {
            tracing::info!("Configuration exists - using {}", config_name.file_name());
            report.already_configured.push(dashboard);
            return Ok(());
        }

        let meta = load_meta(&self.dir, &template.name).await?;
        let context = dashboard_context(
            &self.host_vars,
            &self.account_id,
            check,
            template.instance(),
            &meta,
        );

        let mut config: DashboardConfig = serde_json::from_value(template.config().clone())
            .map_err(|e| {
                RegistrationError::Configuration(format!(
                    "invalid dashboard config in {}: {}",
                    template.path.display(),
                    e
                ))
            })?;

        let warnings = binder.bind(&dashboard, &mut config, &meta, &context)?;
        report.warnings.extend(warnings);

        let path = self.dir.write_new(&config_name, &config).await?;
        tracing::info!("Saved configuration {}", path.display());
        report.configured.push(dashboard);
        Ok(())
    }

    async fn create_dashboard(&self, config_name: &ArtifactName, report: &mut RunReport) -> Result<()> {
        tracing::info!("Creating dashboard {}", config_name.file_name());

        let (record, outcome) = self.sync.create_or_adopt(config_name).await?;
        if outcome != SyncOutcome::AlreadyRegistered {
            tracing::info!(
                "Dashboard '{}': {}",
                record.title().unwrap_or_default(),
                self.dashboard_url(&record)
            );
        }
        report.dashboards.push((config_name.key(), outcome));
        Ok(())
    }

    fn dashboard_url(&self, record: &RegistrationRecord) -> String {
        format!(
            "{}/dashboards/view/{}",
            self.ui_url,
            record.dashboard_uuid().unwrap_or_else(|| record.short_id())
        )
    }
}
