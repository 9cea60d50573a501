use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "config/registration";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub agent: AgentSettings,
    pub registration: RegistrationSettings,
    pub account: AccountSettings,
    /// Host variables available to every dashboard template
    #[serde(default)]
    pub vars: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub url: String,
    pub key: String,
    #[serde(default = "default_app")]
    pub app: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentSettings {
    #[serde(default = "default_agent_url")]
    pub url: String,
    /// Read the metric snapshot from this file instead of the agent
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegistrationSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccountSettings {
    pub account_id: String,
    #[serde(default)]
    pub ui_url: String,
}

fn default_app() -> String {
    "host-registration".to_string()
}

fn default_agent_url() -> String {
    "http://127.0.0.1:2609/".to_string()
}

/// Load settings from `<file>.toml` (optional) overlaid with
/// `REGISTRATION__SECTION__KEY` environment variables
pub fn load_settings(file: Option<&str>) -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(file.unwrap_or(DEFAULT_CONFIG_FILE)).required(file.is_some()))
        .add_source(config::Environment::with_prefix("REGISTRATION").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_settings_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("registration.toml");
        std::fs::write(
            &file,
            r#"
[api]
url = "https://api.example.com/v2"
key = "secret"

[agent]
metrics_file = "/tmp/metrics.json"

[registration]
directory = "/opt/registration"

[account]
account_id = "42"
ui_url = "https://example.com"

[vars]
host_name = "db-01"
"#,
        )
        .unwrap();

        let settings = load_settings(file.to_str()).unwrap();
        assert_eq!(settings.api.url, "https://api.example.com/v2");
        assert_eq!(settings.api.app, "host-registration");
        assert_eq!(settings.agent.url, "http://127.0.0.1:2609/");
        assert_eq!(settings.agent.metrics_file, Some(PathBuf::from("/tmp/metrics.json")));
        assert_eq!(settings.registration.directory, PathBuf::from("/opt/registration"));
        assert_eq!(settings.account.account_id, "42");
        assert_eq!(settings.vars.get("host_name"), Some(&Value::String("db-01".to_string())));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent");
        assert!(load_settings(missing.to_str()).is_err());
    }
}
