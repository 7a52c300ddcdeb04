// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment storage that records revocations instead of deleting files.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use helpmate_core::{
    AdapterType, Attachment, AttachmentStorage, HealthStatus, HelpmateError, PluginAdapter,
};

#[derive(Default)]
pub struct MockAttachments {
    revoked: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl MockAttachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles revoked so far, in call order.
    pub async fn revoked(&self) -> Vec<String> {
        self.revoked.lock().await.clone()
    }

    /// Make revoking `handle` fail.
    pub async fn fail_on(&self, handle: &str) {
        self.failing.lock().await.insert(handle.to_string());
    }
}

#[async_trait]
impl PluginAdapter for MockAttachments {
    fn name(&self) -> &str {
        "mock-attachments"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Attachments
    }

    async fn health_check(&self) -> Result<HealthStatus, HelpmateError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HelpmateError> {
        Ok(())
    }
}

#[async_trait]
impl AttachmentStorage for MockAttachments {
    async fn revoke(&self, attachment: &Attachment) -> Result<(), HelpmateError> {
        if self.failing.lock().await.contains(&attachment.handle) {
            return Err(HelpmateError::Dependency {
                message: format!("failed to revoke attachment {}", attachment.handle),
                source: None,
            });
        }
        self.revoked.lock().await.push(attachment.handle.clone());
        Ok(())
    }
}
