//! Secrets repository
//!
//! Reads secrets mounted into the controller's filesystem. Each secret is a
//! directory of files, one per key, laid out as
//! `<root>/<namespace>/<secret-name>/<key>`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ghstatus_core::domain::secret::Secret;
use std::path::PathBuf;

/// Repository trait for secret lookups
#[async_trait]
pub trait SecretRepository: Send + Sync {
    /// Fetches a secret by namespace and name
    ///
    /// Returns `None` when the secret does not exist.
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;
}

/// Secrets mounted as a directory tree
pub struct MountedSecretRepository {
    root: PathBuf,
}

impl MountedSecretRepository {
    /// Creates a repository rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Rejects names that would escape the secrets root
fn check_segment(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() || value == "." || value == ".." || value.contains('/') {
        anyhow::bail!("Invalid secret {}: '{}'", kind, value);
    }
    Ok(())
}

#[async_trait]
impl SecretRepository for MountedSecretRepository {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        check_segment("namespace", namespace)?;
        check_segment("name", name)?;

        let dir = self.root.join(namespace).join(name);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", dir.display()));
            }
        };

        let mut secret = Secret::new(name);
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Failed to list {}", dir.display()))?
        {
            let key = entry.file_name().to_string_lossy().into_owned();
            // Kubernetes volume mounts keep bookkeeping entries like `..data`.
            if key.starts_with('.') {
                continue;
            }

            let path = entry.path();
            if !tokio::fs::metadata(&path).await?.is_file() {
                continue;
            }

            let value = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            secret.data.insert(key, value);
        }

        Ok(Some(secret))
    }
}
