// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment revocation against the upload directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use helpmate_core::{
    AdapterType, Attachment, AttachmentStorage, HealthStatus, HelpmateError, PluginAdapter,
};

/// Deletes `root_dir/<handle>` on revocation.
///
/// A file that is already gone counts as revoked. Handles that are absolute
/// or contain `..` are refused.
#[derive(Debug, Clone)]
pub struct LocalAttachmentStorage {
    root_dir: PathBuf,
}

impl LocalAttachmentStorage {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn resolve(&self, handle: &str) -> Result<PathBuf, HelpmateError> {
        let relative = Path::new(handle);
        let contained = !handle.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(HelpmateError::Dependency {
                message: format!("attachment handle {handle:?} is outside the upload directory"),
                source: None,
            });
        }
        Ok(self.root_dir.join(relative))
    }
}

#[async_trait]
impl PluginAdapter for LocalAttachmentStorage {
    fn name(&self) -> &str {
        "local-attachments"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Attachments
    }

    async fn health_check(&self) -> Result<HealthStatus, HelpmateError> {
        match tokio::fs::metadata(&self.root_dir).await {
            Ok(meta) if meta.is_dir() => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Unhealthy(format!(
                "{} is not a directory",
                self.root_dir.display()
            ))),
            Err(e) => Ok(HealthStatus::Degraded(format!(
                "upload directory unavailable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), HelpmateError> {
        Ok(())
    }
}

#[async_trait]
impl AttachmentStorage for LocalAttachmentStorage {
    async fn revoke(&self, attachment: &Attachment) -> Result<(), HelpmateError> {
        let path = self.resolve(&attachment.handle)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(handle = %attachment.handle, "attachment revoked");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(handle = %attachment.handle, "attachment already gone");
                Ok(())
            }
            Err(e) => Err(HelpmateError::dependency(
                format!("failed to revoke attachment {}", attachment.handle),
                e,
            )),
        }
    }
}
