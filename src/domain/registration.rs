// Registration records - confirmed remote resources
use super::error::{RegistrationError, Result};
use serde_json::{Map, Value};

/// Remote identity field carried by every registered resource
pub const REMOTE_ID_FIELD: &str = "_cid";

/// A resource the remote API has confirmed exists.
///
/// The full remote representation is kept in `attributes` so the persisted
/// artifact is exactly what the API returned; the fields the pipeline relies
/// on are pulled out explicitly when the record is built.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRecord {
    cid: String,
    attributes: Map<String, Value>,
}

impl RegistrationRecord {
    pub fn from_response(value: Value) -> Result<Self> {
        let attributes = match value {
            Value::Object(attributes) => attributes,
            other => {
                return Err(RegistrationError::Configuration(format!(
                    "expected an object for registration, got {other}"
                )));
            }
        };

        let cid = attributes
            .get(REMOTE_ID_FIELD)
            .and_then(Value::as_str)
            .filter(|cid| !cid.is_empty())
            .ok_or_else(|| {
                RegistrationError::Configuration(format!(
                    "registration is missing '{REMOTE_ID_FIELD}'"
                ))
            })?
            .to_string();

        Ok(Self { cid, attributes })
    }

    /// Remote identity, e.g. `/graph/5c2d...`
    pub fn cid(&self) -> &str {
        &self.cid
    }

    /// Identity with the resource prefix removed (`/graph/abc` -> `abc`)
    pub fn short_id(&self) -> &str {
        self.cid.rsplit('/').next().unwrap_or(&self.cid)
    }

    pub fn title(&self) -> Option<&str> {
        self.attributes.get("title").and_then(Value::as_str)
    }

    pub fn tags(&self) -> Vec<String> {
        self.attributes
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn dashboard_uuid(&self) -> Option<&str> {
        self.attributes.get("_dashboard_uuid").and_then(Value::as_str)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.attributes.clone())
    }
}

/// Identity of the host's system check, bound into metric widgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckMeta {
    pub check_id: String,
    pub check_uuid: String,
}

impl CheckMeta {
    /// Extract from a check bundle registration (`_cid` + `_check_uuids`)
    pub fn from_registration(record: &RegistrationRecord) -> Result<Self> {
        let check_uuid = record
            .attributes()
            .get("_check_uuids")
            .and_then(Value::as_array)
            .and_then(|uuids| uuids.first())
            .and_then(Value::as_str)
            .ok_or_else(|| {
                RegistrationError::Configuration(
                    "check registration has no '_check_uuids'".to_string(),
                )
            })?;

        Ok(Self {
            check_id: record.short_id().to_string(),
            check_uuid: check_uuid.to_string(),
        })
    }
}

/// Local view of a `registration-check-<id>.json` artifact
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSummary {
    pub id: String,
    pub cid: String,
    pub display_name: String,
    pub check_type: String,
    pub active_metrics: usize,
    /// Seconds since the epoch, as reported by the API
    pub last_modified: Option<i64>,
    /// Check paths (`/check/<n>`), one per broker
    pub checks: Vec<String>,
}

impl CheckSummary {
    pub fn from_registration(id: impl Into<String>, record: &RegistrationRecord) -> Self {
        let attributes = record.attributes();
        let text = |key: &str| {
            attributes
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            id: id.into(),
            cid: record.cid().to_string(),
            display_name: text("display_name"),
            check_type: text("type"),
            active_metrics: attributes
                .get("metrics")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
            last_modified: last_modified(attributes),
            checks: attributes
                .get("_checks")
                .and_then(Value::as_array)
                .map(|checks| {
                    checks
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// `_last_modified` of a remote representation
pub fn last_modified(attributes: &Map<String, Value>) -> Option<i64> {
    attributes.get("_last_modified").and_then(Value::as_i64)
}
