use crate::SiteMutationService;
use chrono::Utc;
use tracing::{debug, warn};
use worksite_core::{
    BinaryStore, EntryId, MediaTarget, MediaUpload, MemberId, ProgressEntry, Result, SiteId,
    SiteStore, SiteUpdate, WorksiteError,
};

impl<S, B> SiteMutationService<S, B>
where
    S: SiteStore,
    B: BinaryStore,
{
    /// Appends a gallery entry and, when a target is given, the entry's URL
    /// to the targeted phase's (and step's) photo list. Never touches
    /// progress or status, and lock state does not apply to media.
    pub async fn add_media(
        &self,
        site_id: SiteId,
        target: Option<MediaTarget>,
        upload: MediaUpload,
        actor: MemberId,
    ) -> Result<ProgressEntry> {
        let mut site = self.store.fetch(site_id).await?;
        let now = Utc::now();
        let entry = ProgressEntry::new(upload, target, actor);

        let mut phases_changed = false;
        match target {
            Some(MediaTarget::Phase(phase_id)) => {
                let index = site
                    .phase_index(phase_id)
                    .ok_or_else(|| WorksiteError::not_found("phase", phase_id))?;
                site.phases[index].photos.push(entry.url.clone());
                phases_changed = true;
            }
            Some(MediaTarget::Step { phase, step }) => {
                let phase_index = site
                    .phase_index(phase)
                    .ok_or_else(|| WorksiteError::not_found("phase", phase))?;
                let step_index = site.phases[phase_index]
                    .step_index(step)
                    .ok_or_else(|| WorksiteError::not_found("step", step))?;
                site.phases[phase_index].photos.push(entry.url.clone());
                site.phases[phase_index].steps[step_index]
                    .photos
                    .push(entry.url.clone());
                phases_changed = true;
            }
            None => {}
        }

        site.gallery.push(entry.clone());
        let update = SiteUpdate {
            gallery: Some(site.gallery.clone()),
            phases: phases_changed.then(|| site.phases.clone()),
            updated_at: Some(now),
            updated_by: Some(actor),
            ..Default::default()
        };
        self.store.commit(site_id, update).await?;
        debug!(site = %site_id, entry = %entry.id, "media entry added");
        Ok(entry)
    }

    /// Removes a gallery entry and purges its URL from every phase and step
    /// photo list that held it, in the same commit. The stored binary is then
    /// deleted best-effort: a failure there is logged and swallowed, the
    /// metadata removal stands.
    pub async fn remove_media(
        &self,
        site_id: SiteId,
        entry_id: EntryId,
        actor: MemberId,
    ) -> Result<()> {
        let mut site = self.store.fetch(site_id).await?;
        let now = Utc::now();

        let position = site
            .gallery
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or_else(|| WorksiteError::not_found("media entry", entry_id))?;
        let entry = site.gallery.remove(position);

        let mut phases_changed = false;
        for phase in &mut site.phases {
            if phase.photos.iter().any(|url| url == &entry.url) {
                phase.photos.retain(|url| url != &entry.url);
                phases_changed = true;
            }
            for step in &mut phase.steps {
                if step.photos.iter().any(|url| url == &entry.url) {
                    step.photos.retain(|url| url != &entry.url);
                    phases_changed = true;
                }
            }
        }

        let update = SiteUpdate {
            gallery: Some(site.gallery.clone()),
            phases: phases_changed.then(|| site.phases.clone()),
            updated_at: Some(now),
            updated_by: Some(actor),
            ..Default::default()
        };
        self.store.commit(site_id, update).await?;
        debug!(site = %site_id, entry = %entry_id, "media entry removed");

        if let Err(err) = self.binaries.delete(&entry.url).await {
            warn!(url = %entry.url, error = %err, "media binary deletion failed; metadata already removed");
        }
        Ok(())
    }
}
