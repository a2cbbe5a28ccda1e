use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::debug;
use worksite_core::{clamp_progress, refresh_derived, PhaseId, Site, StepId};

/// Field a local override applies to. Steps are addressed through their
/// owning phase; a step id alone is not a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideKey {
    Phase(PhaseId),
    Step(PhaseId, StepId),
}

#[derive(Debug, Clone, Copy)]
struct ProgressOverride {
    value: u8,
    in_flight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Whether a fresh authoritative snapshot clears previews that have no
    /// write in flight. In-flight overrides always survive snapshots.
    pub drop_previews_on_snapshot: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drop_previews_on_snapshot: true,
        }
    }
}

/// Per-session reconciliation of the live document feed with local
/// optimistic edits.
///
/// Two explicit layers: the authoritative snapshot delivered by the store
/// subscription, and an ephemeral per-field override table fed by UI
/// interaction. The layers are merged at read time by [`view`]; nothing here
/// is persisted or shared across sessions.
///
/// Ordering contract: a snapshot wins for every field except those with a
/// write still in flight, and there is no guarantee the next snapshot
/// reflects this session's own write (another session may have written
/// concurrently, last-writer-wins). Once the round trip settles, success or
/// failure, the override is dropped and the feed is authoritative again.
///
/// [`view`]: LiveSyncController::view
pub struct LiveSyncController {
    authoritative: RwLock<Option<Site>>,
    overrides: RwLock<HashMap<OverrideKey, ProgressOverride>>,
    config: SyncConfig,
}

impl LiveSyncController {
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        Self {
            authoritative: RwLock::new(None),
            overrides: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// The user is interacting with a progress control; show the value
    /// immediately so the control never fights the finger. No write is in
    /// flight yet: the next snapshot may supersede this.
    pub fn preview(&self, key: OverrideKey, raw_value: i64) {
        let value = clamp_progress(raw_value);
        let mut overrides = self.overrides.write();
        let entry = overrides.entry(key).or_insert(ProgressOverride {
            value,
            in_flight: false,
        });
        entry.value = value;
    }

    /// The mutation round trip for this field was issued. The override now
    /// survives incoming snapshots until [`settle`] is called.
    ///
    /// [`settle`]: LiveSyncController::settle
    pub fn begin_write(&self, key: OverrideKey, raw_value: i64) {
        let value = clamp_progress(raw_value);
        self.overrides
            .write()
            .insert(key, ProgressOverride { value, in_flight: true });
    }

    /// The round trip resolved, whether it succeeded or failed. The override
    /// is dropped either way; the next authoritative value wins. On failure
    /// that value is simply the pre-write state arriving with the next
    /// snapshot.
    pub fn settle(&self, key: OverrideKey) {
        self.overrides.write().remove(&key);
    }

    pub fn has_override(&self, key: OverrideKey) -> bool {
        self.overrides.read().contains_key(&key)
    }

    /// Installs an authoritative snapshot. Previews are superseded by the
    /// fresher document; overrides with a write in flight are kept.
    pub fn apply_snapshot(&self, site: Site) {
        if self.config.drop_previews_on_snapshot {
            self.overrides.write().retain(|_, o| o.in_flight);
        }
        *self.authoritative.write() = Some(site);
    }

    /// The merged render model: the authoritative snapshot with local
    /// overrides applied, then the derived progress fields re-derived so the
    /// view stays internally consistent. `None` until the first snapshot
    /// arrives.
    pub fn view(&self) -> Option<Site> {
        let mut site = self.authoritative.read().clone()?;
        {
            let overrides = self.overrides.read();
            if overrides.is_empty() {
                return Some(site);
            }
            for (key, o) in overrides.iter() {
                match key {
                    OverrideKey::Phase(phase_id) => {
                        if let Some(phase) = site.phases.iter_mut().find(|p| p.id == *phase_id) {
                            // A stepped phase derives its progress; a direct
                            // override would be recomputed away below.
                            if phase.steps.is_empty() {
                                phase.progress = o.value;
                            }
                        }
                    }
                    OverrideKey::Step(phase_id, step_id) => {
                        if let Some(step) = site
                            .phases
                            .iter_mut()
                            .find(|p| p.id == *phase_id)
                            .and_then(|p| p.steps.iter_mut().find(|s| s.id == *step_id))
                        {
                            step.progress = o.value;
                        }
                    }
                }
            }
        }
        refresh_derived(&mut site);
        Some(site)
    }

    /// Drains the live feed until the channel closes, installing every
    /// delivered snapshot. Dropping this future abandons interest in the
    /// feed only; any write already issued completes or fails on its own.
    pub async fn run(&self, mut feed: watch::Receiver<Site>) {
        self.apply_snapshot(feed.borrow().clone());
        while feed.changed().await.is_ok() {
            let snapshot = feed.borrow_and_update().clone();
            self.apply_snapshot(snapshot);
        }
        debug!("live feed closed");
    }
}

impl Default for LiveSyncController {
    fn default() -> Self {
        Self::new()
    }
}
