// Main entry point - Dependency injection and pipeline startup
mod application;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::application::checks::{check_statuses, list_checks};
use crate::application::metric_source::MetricSource;
use crate::application::pipeline::RegistrationPipeline;
use crate::infrastructure::agent_metrics::{AgentMetricSource, FileMetricSource};
use crate::infrastructure::api_client::ApiClient;
use crate::infrastructure::artifact_store::RegistrationDirectory;
use crate::infrastructure::config::load_settings;
use crate::presentation::cli::{
    Cli, Command, check_header, check_line, check_long, removal_summary, run_summary,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let settings = load_settings(cli.config.as_deref()).context("loading configuration")?;

    // Remote API and metric snapshot (infrastructure layer)
    let api = Arc::new(ApiClient::new(
        settings.api.url.clone(),
        settings.api.key.clone(),
        settings.api.app.clone(),
    ));
    let metrics: Arc<dyn MetricSource> = match &settings.agent.metrics_file {
        Some(path) => Arc::new(FileMetricSource::new(path.clone())),
        None => Arc::new(AgentMetricSource::new(settings.agent.url.clone())),
    };

    // Pipeline (application layer)
    let pipeline = RegistrationPipeline::new(&settings, api.clone(), metrics);

    match cli.command() {
        Command::Register => {
            tracing::info!(
                "Registration - {}",
                settings.registration.directory.display()
            );
            let report = pipeline.run().await.context("registration failed")?;
            if let Some(stage) = report.stages.last() {
                tracing::debug!("Reached stage {}", stage);
            }
            if report.created() == 0 {
                tracing::info!("Nothing new to register");
            }
            tracing::info!("{}", run_summary(&report));
        }
        Command::Update { artifact } => {
            let record = pipeline.update(&artifact).await.context("update failed")?;
            tracing::info!("Updated {}", record.cid());
        }
        Command::Deregister => {
            let removed = pipeline.deregister().await.context("deregistration failed")?;
            tracing::info!("{}", removal_summary(&removed));
        }
        Command::Checks {
            quiet,
            long,
            verify,
        } => {
            let dir = RegistrationDirectory::new(settings.registration.directory.clone());
            let checks = list_checks(&dir).await.context("listing checks")?;
            let statuses = check_statuses(api.as_ref(), checks, verify)
                .await
                .context("verifying checks")?;

            if !quiet && !long {
                println!("{}", check_header());
            }
            for (check, status) in &statuses {
                if long {
                    for line in check_long(check, *status, &settings.account.ui_url) {
                        println!("{}", line);
                    }
                } else {
                    println!("{}", check_line(check, *status));
                }
            }
        }
    }

    Ok(())
}
