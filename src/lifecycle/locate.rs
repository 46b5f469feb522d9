//! Name-based lookup of workspace resources.

use crate::probe::ReadinessProbe;
use crate::provider::{CloudApi, Server, Volume};

use super::{Lifecycle, ProvisionError};

impl<A: CloudApi, P: ReadinessProbe> Lifecycle<A, P> {
    /// Finds the server called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::MultipleServersFound`] when the name is
    /// ambiguous, or [`ProvisionError::Provider`] when listing fails.
    pub async fn find_server_by_name(&self, name: &str) -> Result<Option<Server>, ProvisionError> {
        let servers = self.api.servers_by_name(name).await?;
        at_most_one(servers).ok_or_else(|| ProvisionError::MultipleServersFound(name.to_owned()))
    }

    /// Finds the volume called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::MultipleVolumesFound`] when the name is
    /// ambiguous, or [`ProvisionError::Provider`] when listing fails.
    pub async fn find_volume_by_name(&self, name: &str) -> Result<Option<Volume>, ProvisionError> {
        let volumes = self.api.volumes_by_name(name).await?;
        at_most_one(volumes).ok_or_else(|| ProvisionError::MultipleVolumesFound(name.to_owned()))
    }
}

/// Returns `None` when `items` holds more than one element.
fn at_most_one<T>(items: Vec<T>) -> Option<Option<T>> {
    let mut iter = items.into_iter();
    let first = iter.next();
    if iter.next().is_some() {
        return None;
    }
    Some(first)
}
