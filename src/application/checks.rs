// Local check registrations and their state on the remote API
use crate::application::platform_api::PlatformApi;
use crate::domain::error::{RegistrationError, Result};
use crate::domain::registration::{CheckSummary, RegistrationRecord, last_modified};
use crate::infrastructure::artifact_store::RegistrationDirectory;
use serde_json::Value;
use std::fmt;

const CHECK_REGISTRATION_PREFIX: &str = "registration-check-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Not compared against the API
    Unverified,
    /// Remote check has the same revision as the local registration
    Ok,
    Modified,
    /// The API no longer knows the check
    Missing,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckStatus::Unverified => "n/a",
            CheckStatus::Ok => "OK",
            CheckStatus::Modified => "Modified",
            CheckStatus::Missing => "Missing",
        };
        f.pad(label)
    }
}

/// Every `registration-check-<id>.json`, in file name order
pub async fn list_checks(dir: &RegistrationDirectory) -> Result<Vec<CheckSummary>> {
    let mut checks = Vec::new();

    for file_name in dir.list_files(CHECK_REGISTRATION_PREFIX).await? {
        let id = file_name
            .trim_start_matches(CHECK_REGISTRATION_PREFIX)
            .trim_end_matches(".json");
        let value: Value = dir.read_file(&file_name).await?;
        let record = RegistrationRecord::from_response(value)
            .map_err(|e| RegistrationError::Configuration(format!("{file_name}: {e}")))?;
        checks.push(CheckSummary::from_registration(id, &record));
    }

    if checks.is_empty() {
        return Err(RegistrationError::Configuration(format!(
            "No local checks found in {}",
            dir.root().display()
        )));
    }

    Ok(checks)
}

/// Compare a local check registration with what the API currently holds
pub async fn verify_check(api: &dyn PlatformApi, check: &CheckSummary) -> Result<CheckStatus> {
    tracing::debug!("Verifying check {} ({})", check.id, check.cid);

    let response = api.get(&check.cid, &[]).await?;
    if response.is_instance_not_found() {
        return Ok(CheckStatus::Missing);
    }
    if !response.is_ok() {
        return Err(RegistrationError::api(response.status, &response.body));
    }

    let remote = response.body.as_object().and_then(last_modified);
    if remote.is_some() && remote == check.last_modified {
        Ok(CheckStatus::Ok)
    } else {
        Ok(CheckStatus::Modified)
    }
}

/// Statuses for every check, verified one at a time when `verify` is set
pub async fn check_statuses(
    api: &dyn PlatformApi,
    checks: Vec<CheckSummary>,
    verify: bool,
) -> Result<Vec<(CheckSummary, CheckStatus)>> {
    let mut statuses = Vec::with_capacity(checks.len());

    for check in checks {
        let status = if verify {
            verify_check(api, &check).await?
        } else {
            CheckStatus::Unverified
        };
        statuses.push((check, status));
    }

    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingApi, write_file};
    use serde_json::json;
    use tempfile::TempDir;

    fn write_checks(dir: &std::path::Path) {
        write_file(dir, "registration-check-system.json", json!({
            "_cid": "/check_bundle/1001",
            "_checks": ["/check/2001"],
            "_last_modified": 100,
            "display_name": "db1 cosi/system",
            "type": "json:nad",
            "metrics": [{"name": "cpu`idle"}]
        }));
        write_file(dir, "registration-check-statsd.json", json!({
            "_cid": "/check_bundle/1002",
            "_last_modified": 200,
            "display_name": "db1 cosi/statsd",
            "type": "httptrap",
            "metrics": []
        }));
        write_file(dir, "registration-graph-cpu-0-.json", json!({"_cid": "/graph/1"}));
    }

    #[tokio::test]
    async fn test_list_checks() {
        let temp_dir = TempDir::new().unwrap();
        let dir = RegistrationDirectory::new(temp_dir.path());
        assert!(matches!(
            list_checks(&dir).await,
            Err(RegistrationError::Configuration(ref msg)) if msg.starts_with("No local checks found")
        ));

        write_checks(temp_dir.path());
        let checks = list_checks(&dir).await.unwrap();
        let ids: Vec<&str> = checks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["statsd", "system"]);
        assert_eq!(checks[1].active_metrics, 1);
        assert_eq!(checks[1].check_type, "json:nad");
    }

    #[tokio::test]
    async fn test_unverified_listing_makes_no_calls() {
        let temp_dir = TempDir::new().unwrap();
        write_checks(temp_dir.path());
        let dir = RegistrationDirectory::new(temp_dir.path());
        let api = RecordingApi::new();

        let statuses = check_statuses(&api, list_checks(&dir).await.unwrap(), false)
            .await
            .unwrap();
        assert!(statuses.iter().all(|(_, s)| *s == CheckStatus::Unverified));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_verify_in_order() {
        let temp_dir = TempDir::new().unwrap();
        write_checks(temp_dir.path());
        let dir = RegistrationDirectory::new(temp_dir.path());
        let api = RecordingApi::new();
        api.push(200, json!({"_cid": "/check_bundle/1002", "_last_modified": 250}));
        api.push(200, json!({"_cid": "/check_bundle/1001", "_last_modified": 100}));

        let statuses = check_statuses(&api, list_checks(&dir).await.unwrap(), true)
            .await
            .unwrap();
        let result: Vec<(&str, CheckStatus)> =
            statuses.iter().map(|(c, s)| (c.id.as_str(), *s)).collect();
        assert_eq!(
            result,
            vec![("statsd", CheckStatus::Modified), ("system", CheckStatus::Ok)]
        );

        let paths: Vec<String> = api.calls().into_iter().map(|c| c.path).collect();
        assert_eq!(paths, vec!["/check_bundle/1002", "/check_bundle/1001"]);
    }

    #[tokio::test]
    async fn test_verify_statuses_and_errors() {
        let temp_dir = TempDir::new().unwrap();
        write_checks(temp_dir.path());
        let dir = RegistrationDirectory::new(temp_dir.path());
        let checks = list_checks(&dir).await.unwrap();
        let api = RecordingApi::new();

        api.push(404, json!({"code": "ObjectError.InstanceNotFound"}));
        assert_eq!(verify_check(&api, &checks[0]).await.unwrap(), CheckStatus::Missing);

        api.push(200, json!({"_cid": "/check_bundle/1002"}));
        assert_eq!(verify_check(&api, &checks[0]).await.unwrap(), CheckStatus::Modified);

        api.push(403, json!({"code": "Forbidden"}));
        assert!(matches!(
            check_statuses(&api, checks, true).await,
            Err(RegistrationError::Api { status: 403, .. })
        ));
        assert_eq!(api.calls().len(), 3);
    }
}
