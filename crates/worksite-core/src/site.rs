use crate::{
    ClientId, EntryId, MediaKind, MediaTarget, MemberId, PhaseCategory, PhaseId, SiteId,
    SiteStatus, StepId, WorkStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One construction project under execution. The top-level document: the unit
/// of atomicity for every persisted update.
///
/// `global_progress` and `status` are derived fields. They are recomputed by
/// the mutation service on every write and are never accepted as input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: SiteId,
    pub client_id: ClientId,
    pub supervisor_id: MemberId,
    pub address: String,
    pub planned_start: DateTime<Utc>,
    pub planned_end: DateTime<Utc>,
    pub actual_end: Option<DateTime<Utc>>,
    pub phases: Vec<Phase>,
    pub team: Vec<TeamMember>,
    pub gallery: Vec<ProgressEntry>,
    pub status: SiteStatus,
    pub global_progress: u8,
    pub updated_at: DateTime<Utc>,
    pub updated_by: MemberId,
}

impl Site {
    pub fn new(
        client_id: ClientId,
        supervisor_id: MemberId,
        address: impl Into<String>,
        planned_start: DateTime<Utc>,
        planned_end: DateTime<Utc>,
        created_by: MemberId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            supervisor_id,
            address: address.into(),
            planned_start,
            planned_end,
            actual_end: None,
            phases: Vec::new(),
            team: Vec::new(),
            gallery: Vec::new(),
            status: SiteStatus::Awaiting,
            global_progress: 0,
            updated_at: Utc::now(),
            updated_by: created_by,
        }
    }

    /// Installs the initial phase list and brings the derived fields in line
    /// with it. Phases are created once, in order, and never reordered after.
    pub fn with_phases(mut self, phases: Vec<Phase>) -> Self {
        self.phases = phases;
        crate::progress::refresh_derived(&mut self);
        self
    }

    pub fn phase(&self, id: PhaseId) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }

    pub fn phase_index(&self, id: PhaseId) -> Option<usize> {
        self.phases.iter().position(|p| p.id == id)
    }
}

/// A major unit of work within a site. A phase either owns an ordered step
/// list (progress derived) or is a leaf carrying its own progress value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: PhaseId,
    pub name: String,
    #[serde(default)]
    pub category: PhaseCategory,
    pub progress: u8,
    pub status: WorkStatus,
    pub steps: Vec<Step>,
    pub notes: Option<String>,
    pub photos: Vec<String>,
    pub updated_by: Option<MemberId>,
    pub updated_at: DateTime<Utc>,
}

impl Phase {
    pub fn new(name: impl Into<String>, category: PhaseCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
            progress: 0,
            status: WorkStatus::Pending,
            steps: Vec::new(),
            notes: None,
            photos: Vec::new(),
            updated_by: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self.status = crate::progress::work_status(self.progress);
        self
    }

    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn step_index(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }
}

/// Smallest trackable unit of work. Array order within the owning phase is
/// significant and never re-sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: StepId,
    pub name: String,
    pub progress: u8,
    pub status: WorkStatus,
    pub photos: Vec<String>,
    pub updated_by: Option<MemberId>,
    pub updated_at: DateTime<Utc>,
}

impl Step {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            progress: 0,
            status: WorkStatus::Pending,
            photos: Vec::new(),
            updated_by: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self.status = crate::progress::work_status(self.progress);
        self
    }
}

/// Roster entry. Immutable once added; the only roster mutations are append
/// and removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: MemberId,
    pub name: String,
    pub trade: String,
    pub phone: Option<String>,
    pub experience: Option<String>,
    pub added_at: DateTime<Utc>,
    pub added_by: MemberId,
}

impl TeamMember {
    pub fn new(meta: NewTeamMember, added_by: MemberId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: meta.name,
            trade: meta.trade,
            phone: meta.phone,
            experience: meta.experience,
            added_at: Utc::now(),
            added_by,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamMember {
    pub name: String,
    pub trade: String,
    pub phone: Option<String>,
    pub experience: Option<String>,
}

/// Gallery item pointing at an externally stored image or video. Append-only
/// except for explicit removal, which also purges the URL from any phase or
/// step photo list that referenced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub id: EntryId,
    pub url: String,
    pub phase_id: Option<PhaseId>,
    pub step_id: Option<StepId>,
    pub caption: Option<String>,
    pub kind: MediaKind,
    pub duration_secs: Option<u32>,
    pub thumbnail_url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: MemberId,
}

impl ProgressEntry {
    pub fn new(upload: MediaUpload, target: Option<MediaTarget>, uploaded_by: MemberId) -> Self {
        let (phase_id, step_id) = match target {
            Some(MediaTarget::Phase(phase)) => (Some(phase), None),
            Some(MediaTarget::Step { phase, step }) => (Some(phase), Some(step)),
            None => (None, None),
        };
        Self {
            id: Uuid::new_v4(),
            url: upload.url,
            phase_id,
            step_id,
            caption: upload.caption,
            kind: upload.kind,
            duration_secs: upload.duration_secs,
            thumbnail_url: upload.thumbnail_url,
            uploaded_at: Utc::now(),
            uploaded_by,
        }
    }
}

/// Caller-supplied metadata for a new gallery entry. The binary itself lives
/// in external storage; only its URL crosses this boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpload {
    pub url: String,
    pub caption: Option<String>,
    pub kind: MediaKind,
    /// Video only.
    pub duration_secs: Option<u32>,
    /// Video only.
    pub thumbnail_url: Option<String>,
}

impl MediaUpload {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            caption: None,
            kind: MediaKind::Image,
            duration_secs: None,
            thumbnail_url: None,
        }
    }

    pub fn video(url: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            url: url.into(),
            caption: None,
            kind: MediaKind::Video,
            duration_secs: Some(duration_secs),
            thumbnail_url: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }
}
