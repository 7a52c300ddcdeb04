// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment storage collaborator.

use async_trait::async_trait;

use crate::error::HelpmateError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Attachment;

/// The external storage that holds uploaded attachment bytes.
///
/// The chat core never uploads; it only revokes the handles of attachments
/// that an edit replaces.
#[async_trait]
pub trait AttachmentStorage: PluginAdapter {
    /// Deletes the stored object behind `attachment.handle`.
    ///
    /// Revoking a handle that is already gone must succeed.
    async fn revoke(&self, attachment: &Attachment) -> Result<(), HelpmateError>;
}
