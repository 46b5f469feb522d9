//! Registration of the workspace access key.

use tracing::{debug, info};
use uuid::Uuid;

use crate::fingerprint::fingerprint;
use crate::probe::ReadinessProbe;
use crate::provider::{CloudApi, CreateSshKeyRequest, SshKey};
use crate::workspace::WorkspaceName;

use super::{Lifecycle, ProvisionError};

/// Characters of the workspace name kept in generated key names.
const KEY_NAME_PREFIX_LEN: usize = 24;

/// Length of the random suffix of generated key names.
const KEY_NAME_SUFFIX_LEN: usize = 8;

impl<A: CloudApi, P: ReadinessProbe> Lifecycle<A, P> {
    /// Returns the registered key matching `public_key`, uploading it first
    /// when the provider does not know it yet.
    ///
    /// Keys are matched by fingerprint, so a key uploaded under another name
    /// is reused.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::BadCredential`] when the key cannot be
    /// parsed, or [`ProvisionError::Provider`] when a call fails.
    pub async fn upsert_ssh_key(
        &self,
        public_key: &str,
        workspace: &WorkspaceName,
    ) -> Result<SshKey, ProvisionError> {
        let key_fingerprint = fingerprint(public_key)?;
        if let Some(existing) = self.api.ssh_key_by_fingerprint(&key_fingerprint).await? {
            debug!(name = %existing.name, fingerprint = %key_fingerprint, "reusing registered key");
            return Ok(existing);
        }

        let request = CreateSshKeyRequest {
            name: key_name(workspace),
            public_key: public_key.trim().to_owned(),
            labels: workspace.key_labels(),
        };
        info!(name = %request.name, fingerprint = %key_fingerprint, "uploading workspace key");
        Ok(self.api.create_ssh_key(&request).await?)
    }
}

/// Builds a provider-unique key name from the workspace name.
pub(super) fn key_name(workspace: &WorkspaceName) -> String {
    let prefix: String = workspace
        .as_str()
        .chars()
        .take(KEY_NAME_PREFIX_LEN)
        .collect();
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(KEY_NAME_SUFFIX_LEN)
        .collect();
    format!("{prefix}-{suffix}")
}
