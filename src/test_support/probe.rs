//! Scripted readiness probe.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::keys::IdentityFile;
use crate::probe::{BootStatus, ReadinessProbe};
use crate::provider::Server;

#[derive(Debug, Default)]
struct ProbeScript {
    queued: VecDeque<Option<BootStatus>>,
    fallback: Option<BootStatus>,
    probed: Vec<String>,
}

/// Readiness probe returning queued answers, then a fixed fallback.
///
/// Clones share the same script.
#[derive(Clone, Debug, Default)]
pub struct ScriptedProbe {
    script: Arc<Mutex<ProbeScript>>,
}

impl ScriptedProbe {
    /// Probe that reports `done` once its queue is drained.
    #[must_use]
    pub fn ready() -> Self {
        let probe = Self::default();
        probe.lock().fallback = Some(status("done"));
        probe
    }

    /// Probe that never determines a status once its queue is drained.
    #[must_use]
    pub fn never_ready() -> Self {
        Self::default()
    }

    /// Queues a reported cloud-init status such as `running`.
    pub fn push_status(&self, value: &str) {
        self.lock().queued.push_back(Some(status(value)));
    }

    /// Queues an unreachable host.
    pub fn push_unreachable(&self) {
        self.lock().queued.push_back(None);
    }

    /// Names of the servers probed so far, one entry per attempt.
    #[must_use]
    pub fn probed(&self) -> Vec<String> {
        self.lock().probed.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ProbeScript> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReadinessProbe for ScriptedProbe {
    fn probe(&self, server: &Server, _identity: &IdentityFile) -> Option<BootStatus> {
        let mut script = self.lock();
        script.probed.push(server.name.clone());
        let next = script.queued.pop_front();
        next.unwrap_or_else(|| script.fallback.clone())
    }
}

fn status(value: &str) -> BootStatus {
    BootStatus {
        status: value.to_owned(),
    }
}
