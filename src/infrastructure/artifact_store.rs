// Registration directory - durable JSON artifacts
use crate::domain::error::{RegistrationError, Result};
use crate::domain::template::{ArtifactKind, ArtifactName, ResourceType};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct RegistrationDirectory {
    root: PathBuf,
}

impl RegistrationDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &ArtifactName) -> PathBuf {
        self.root.join(name.file_name())
    }

    pub async fn exists(&self, name: &ArtifactName) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path(name)).await?)
    }

    /// Artifacts of one role (and optionally one resource type), sorted by file name
    pub async fn list(
        &self,
        kind: ArtifactKind,
        resource: Option<&ResourceType>,
    ) -> Result<Vec<ArtifactName>> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            RegistrationError::Configuration(format!(
                "unable to read registration directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(ArtifactName::parse) else {
                continue;
            };
            if name.kind == kind && resource.is_none_or(|r| *r == name.resource) {
                names.push(name);
            }
        }

        names.sort_by_key(ArtifactName::file_name);
        Ok(names)
    }

    /// Names of `<prefix>*.json` files that do not follow the four part
    /// naming scheme (e.g. `registration-check-system.json`), sorted
    pub async fn list_files(&self, prefix: &str) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            RegistrationError::Configuration(format!(
                "unable to read registration directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(file_name) = entry.file_name().to_str() {
                if file_name.starts_with(prefix) && file_name.ends_with(".json") {
                    names.push(file_name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    pub async fn read_file<T: DeserializeOwned>(&self, file_name: &str) -> Result<T> {
        let path = self.root.join(file_name);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            RegistrationError::Configuration(format!("unable to read {}: {}", path.display(), e))
        })?;
        decode(&path, &bytes)
    }

    /// Read and decode an artifact; absence and malformed content are both
    /// configuration errors
    pub async fn read_json<T: DeserializeOwned>(&self, name: &ArtifactName) -> Result<T> {
        self.read_optional(name).await?.ok_or_else(|| {
            RegistrationError::Configuration(format!("missing file {}", self.path(name).display()))
        })
    }

    pub async fn read_optional<T: DeserializeOwned>(&self, name: &ArtifactName) -> Result<Option<T>> {
        let path = self.path(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        decode(&path, &bytes).map(Some)
    }

    /// Write an artifact that must not exist yet
    pub async fn write_new<T: Serialize>(&self, name: &ArtifactName, value: &T) -> Result<PathBuf> {
        let path = self.path(name);
        let bytes = to_pretty_json(value)?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        Ok(path)
    }

    /// Write an artifact, replacing any previous content
    pub async fn replace<T: Serialize>(&self, name: &ArtifactName, value: &T) -> Result<PathBuf> {
        let path = self.path(name);
        tokio::fs::write(&path, to_pretty_json(value)?).await?;
        Ok(path)
    }

    /// Remove an artifact; a missing file is not an error
    pub async fn remove(&self, name: &ArtifactName) -> Result<()> {
        match tokio::fs::remove_file(self.path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn decode<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        RegistrationError::Configuration(format!("unable to parse {}: {}", path.display(), e))
    })
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(buffer)
}
