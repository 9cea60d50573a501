// Command line arguments and run summaries
use crate::application::checks::CheckStatus;
use crate::application::pipeline::RunReport;
use crate::application::synchronizer::{RemoveOutcome, SyncOutcome};
use crate::domain::registration::CheckSummary;
use chrono::{DateTime, SecondsFormat};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "host-registration", about = "Register graphs and dashboards for this host")]
pub struct Cli {
    /// Configuration file (TOML), without or with extension
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone, PartialEq, Eq)]
pub enum Command {
    /// Configure and create graphs and dashboards (default)
    Register,
    /// Remove every registered dashboard and graph
    Deregister,
    /// Push a changed config artifact for an already registered resource
    Update {
        /// File name of the config artifact, e.g. config-dashboard-postgres-db1.json
        artifact: String,
    },
    /// List local check registrations
    Checks {
        /// No header line
        #[arg(short, long)]
        quiet: bool,
        /// Long listing, including check URLs
        #[arg(short, long)]
        long: bool,
        /// Compare each check with the API
        #[arg(long)]
        verify: bool,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Register)
    }
}

pub fn run_summary(report: &RunReport) -> String {
    let count = |items: &[(String, SyncOutcome)], outcome: SyncOutcome| {
        items.iter().filter(|(_, o)| *o == outcome).count()
    };

    format!(
        "graphs: {} created, {} adopted, {} existing; dashboards: {} configured ({} existing), {} created, {} adopted, {} existing; {} widget warning(s)",
        count(&report.graphs, SyncOutcome::Created),
        count(&report.graphs, SyncOutcome::Adopted),
        count(&report.graphs, SyncOutcome::AlreadyRegistered),
        report.configured.len(),
        report.already_configured.len(),
        count(&report.dashboards, SyncOutcome::Created),
        count(&report.dashboards, SyncOutcome::Adopted),
        count(&report.dashboards, SyncOutcome::AlreadyRegistered),
        report.warnings.len(),
    )
}

pub fn removal_summary(removed: &[(String, RemoveOutcome)]) -> String {
    let absent = removed
        .iter()
        .filter(|(_, o)| *o == RemoveOutcome::AlreadyAbsent)
        .count();
    format!(
        "removed {} resource(s), {} already absent",
        removed.len() - absent,
        absent
    )
}

pub fn check_header() -> String {
    format!(
        "{:<12} {:<40} {:<10} {:>8} {:<25} {:<8}",
        "ID", "Name", "Type", "#Active", "Modified", "Status"
    )
}

pub fn check_line(check: &CheckSummary, status: CheckStatus) -> String {
    let name: String = check.display_name.chars().take(40).collect();
    format!(
        "{:<12} {:<40} {:<10} {:>8} {:<25} {:<8}",
        check.id,
        name,
        check.check_type,
        check.active_metrics,
        modified(check.last_modified),
        status
    )
}

/// Multi-line form with one UI URL per check
pub fn check_long(check: &CheckSummary, status: CheckStatus, ui_url: &str) -> Vec<String> {
    let mut lines = vec![
        "================".to_string(),
        format!("{:<15}: {}", "Check ID", check.id),
        format!("{:<15}: {}", "Check Name", check.display_name),
        format!("{:<15}: {}", "Check Type", check.check_type),
        format!("{:<15}: {}", "Active metrics", check.active_metrics),
        format!("{:<15}: {}", "Last modified", modified(check.last_modified)),
    ];
    if status != CheckStatus::Unverified {
        lines.push(format!("{:<15}: {}", "Check status", status));
    }
    for path in &check.checks {
        lines.push(format!("{:<15}: {}", "Check URL", check_url(ui_url, path)));
    }
    lines
}

/// `/check/2001` is shown in the UI under `/checks/2001`
fn check_url(ui_url: &str, path: &str) -> String {
    format!(
        "{}{}",
        ui_url.trim_end_matches('/'),
        path.replacen("check", "checks", 1)
    )
}

fn modified(last_modified: Option<i64>) -> String {
    last_modified
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "unknown".to_string())
}
