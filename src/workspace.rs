//! Workspace identity and the labels derived from it.

use std::fmt;

use crate::provider::Labels;

/// Namespace prefix applied to every workspace resource name.
pub const WORKSPACE_PREFIX: &str = "devpod-";

/// Label key marking resources owned by this provider.
pub const TYPE_LABEL: &str = "type";

/// Value of [`TYPE_LABEL`] on owned resources.
pub const TYPE_LABEL_VALUE: &str = "devpod";

/// Label key tying an uploaded key to its workspace.
pub const MACHINE_ID_LABEL: &str = "devpod.sh/machine-id";

/// Name shared by a workspace's server and volume.
///
/// The name is derived from the DevPod machine id by applying
/// [`WORKSPACE_PREFIX`]; ids that already carry the prefix are kept as is.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct WorkspaceName(String);

impl WorkspaceName {
    /// Derives the workspace name from a machine id.
    #[must_use]
    pub fn from_machine_id(machine_id: &str) -> Self {
        let trimmed = machine_id.trim();
        if trimmed.starts_with(WORKSPACE_PREFIX) {
            Self(trimmed.to_owned())
        } else {
            Self(format!("{WORKSPACE_PREFIX}{trimmed}"))
        }
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Label selector matching keys uploaded for this workspace.
    #[must_use]
    pub fn key_label_selector(&self) -> String {
        format!("{MACHINE_ID_LABEL}={}", self.0)
    }

    /// Labels attached to an uploaded key.
    #[must_use]
    pub fn key_labels(&self) -> Labels {
        let mut labels = resource_labels();
        labels.insert(MACHINE_ID_LABEL.to_owned(), self.0.clone());
        labels
    }
}

impl fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WorkspaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Labels attached to every server and volume the provider creates.
#[must_use]
pub fn resource_labels() -> Labels {
    Labels::from([(TYPE_LABEL.to_owned(), TYPE_LABEL_VALUE.to_owned())])
}
