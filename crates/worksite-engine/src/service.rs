use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use worksite_core::{
    clamp_progress, lock_states, phase_locked, refresh_derived, site_status, step_locked,
    BinaryStore, MemberId, PhaseId, PhaseLockState, Result, Site, SiteId, SiteStore, SiteUpdate,
    StepId, WorksiteError,
};

/// The only component allowed to write site documents.
///
/// Every operation is one logical read-modify-write: fetch the current
/// document, validate against it, recompute the derived fields, and land a
/// single atomic partial-document commit. Validation always runs against the
/// freshly read document, never against whatever the caller's display layer
/// believed; a stale lock computation in some session cannot authorize a
/// write here.
pub struct SiteMutationService<S, B> {
    pub(crate) store: Arc<S>,
    pub(crate) binaries: Arc<B>,
}

impl<S, B> SiteMutationService<S, B>
where
    S: SiteStore,
    B: BinaryStore,
{
    pub fn new(store: Arc<S>, binaries: Arc<B>) -> Self {
        Self { store, binaries }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Sets one step's progress and rolls the change up: step status, owning
    /// phase progress/status, site-wide progress/status, one commit.
    ///
    /// Out-of-range values are clamped, not rejected. Edits to a locked phase
    /// or step are rejected with `LockedDependency` before anything is
    /// written.
    pub async fn set_step_progress(
        &self,
        site_id: SiteId,
        phase_id: PhaseId,
        step_id: StepId,
        raw_progress: i64,
        actor: MemberId,
    ) -> Result<Site> {
        let mut site = self.store.fetch(site_id).await?;
        let now = Utc::now();
        let value = clamp_progress(raw_progress);

        let phase_index = site
            .phase_index(phase_id)
            .ok_or_else(|| WorksiteError::not_found("phase", phase_id))?;
        if phase_locked(&site.phases, phase_index) {
            debug!(site = %site_id, phase = %phase_id, "progress edit rejected: phase locked");
            return Err(WorksiteError::locked("phase", phase_id));
        }

        let phase = &mut site.phases[phase_index];
        let step_index = phase
            .step_index(step_id)
            .ok_or_else(|| WorksiteError::not_found("step", step_id))?;
        if step_locked(&phase.steps, step_index) {
            debug!(site = %site_id, step = %step_id, "progress edit rejected: step locked");
            return Err(WorksiteError::locked("step", step_id));
        }

        let step = &mut phase.steps[step_index];
        step.progress = value;
        step.updated_by = Some(actor);
        step.updated_at = now;
        phase.updated_by = Some(actor);
        phase.updated_at = now;

        debug!(site = %site_id, phase = %phase_id, step = %step_id, value, "step progress accepted");
        self.commit_progress(site, now, actor).await
    }

    /// Sets a leaf phase's progress directly. A phase owning steps never
    /// accepts this: its progress is derived, and the attempt fails with
    /// `InvalidTarget` before any write.
    pub async fn set_phase_progress(
        &self,
        site_id: SiteId,
        phase_id: PhaseId,
        raw_progress: i64,
        notes: Option<String>,
        actor: MemberId,
    ) -> Result<Site> {
        let mut site = self.store.fetch(site_id).await?;
        let now = Utc::now();
        let value = clamp_progress(raw_progress);

        let phase_index = site
            .phase_index(phase_id)
            .ok_or_else(|| WorksiteError::not_found("phase", phase_id))?;
        if site.phases[phase_index].has_steps() {
            return Err(WorksiteError::InvalidTarget {
                id: phase_id.to_string(),
                step_count: site.phases[phase_index].steps.len(),
            });
        }
        if phase_locked(&site.phases, phase_index) {
            debug!(site = %site_id, phase = %phase_id, "progress edit rejected: phase locked");
            return Err(WorksiteError::locked("phase", phase_id));
        }

        let phase = &mut site.phases[phase_index];
        phase.progress = value;
        if let Some(notes) = notes {
            phase.notes = Some(notes);
        }
        phase.updated_by = Some(actor);
        phase.updated_at = now;

        debug!(site = %site_id, phase = %phase_id, value, "phase progress accepted");
        self.commit_progress(site, now, actor).await
    }

    /// Lock signals for every phase and step, computed on demand from the
    /// current persisted document. Display-only; never stored.
    pub async fn lock_states(&self, site_id: SiteId) -> Result<Vec<PhaseLockState>> {
        let site = self.store.fetch(site_id).await?;
        Ok(lock_states(&site))
    }

    /// Recomputes the site-level derived fields and lands the progress commit:
    /// phases, global progress, status, and audit metadata in one write.
    async fn commit_progress(
        &self,
        mut site: Site,
        now: chrono::DateTime<Utc>,
        actor: MemberId,
    ) -> Result<Site> {
        refresh_derived(&mut site);
        site.status = site_status(&site.phases, site.planned_end, now);
        site.updated_at = now;
        site.updated_by = actor;

        let update = SiteUpdate {
            phases: Some(site.phases.clone()),
            global_progress: Some(site.global_progress),
            status: Some(site.status),
            updated_at: Some(now),
            updated_by: Some(actor),
            ..Default::default()
        };
        self.store.commit(site.id, update).await?;
        Ok(site)
    }
}
