use crate::{MemberId, Phase, ProgressEntry, Site, SiteStatus, TeamMember};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Partial-document write payload: only the changed top-level fields of the
/// site. Absent fields are omitted from serialization entirely, never written
/// as null, so an update can be shipped to a merge-style document store
/// verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<Phase>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SiteStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<MemberId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery: Option<Vec<ProgressEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<Vec<TeamMember>>,
}

impl SiteUpdate {
    pub fn is_empty(&self) -> bool {
        self.phases.is_none()
            && self.global_progress.is_none()
            && self.status.is_none()
            && self.updated_at.is_none()
            && self.updated_by.is_none()
            && self.gallery.is_none()
            && self.team.is_none()
    }

    /// Merges the present fields into the document, leaving the rest alone.
    pub fn apply_to(self, site: &mut Site) {
        if let Some(phases) = self.phases {
            site.phases = phases;
        }
        if let Some(global_progress) = self.global_progress {
            site.global_progress = global_progress;
        }
        if let Some(status) = self.status {
            site.status = status;
        }
        if let Some(updated_at) = self.updated_at {
            site.updated_at = updated_at;
        }
        if let Some(updated_by) = self.updated_by {
            site.updated_by = updated_by;
        }
        if let Some(gallery) = self.gallery {
            site.gallery = gallery;
        }
        if let Some(team) = self.team {
            site.team = team;
        }
    }
}
