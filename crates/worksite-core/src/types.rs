use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type SiteId = Uuid;
pub type ClientId = Uuid;
pub type PhaseId = Uuid;
pub type StepId = Uuid;
pub type EntryId = Uuid;
pub type MemberId = Uuid;

/// Wire tag of the dependency-bearing phase category. Fixed domain constant;
/// phases carrying any other tag are never locked by the category rule.
pub const STRUCTURAL_TAG: &str = "gros_oeuvre";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PhaseCategory {
    /// Structural shell work. The only category whose phases must complete
    /// in document order relative to each other.
    Structural,
    Finishing,
    Technical,
    Landscaping,
    Other(String),
}

impl PhaseCategory {
    pub fn is_dependency_bearing(&self) -> bool {
        matches!(self, PhaseCategory::Structural)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PhaseCategory::Structural => STRUCTURAL_TAG,
            PhaseCategory::Finishing => "second_oeuvre",
            PhaseCategory::Technical => "technique",
            PhaseCategory::Landscaping => "exterieur",
            PhaseCategory::Other(s) => s.as_str(),
        }
    }
}

impl Default for PhaseCategory {
    /// Documents written before the category tag existed carry none; they are
    /// never dependency-bearing.
    fn default() -> Self {
        PhaseCategory::Other(String::new())
    }
}

impl From<String> for PhaseCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            STRUCTURAL_TAG => PhaseCategory::Structural,
            "second_oeuvre" => PhaseCategory::Finishing,
            "technique" => PhaseCategory::Technical,
            "exterieur" => PhaseCategory::Landscaping,
            _ => PhaseCategory::Other(value),
        }
    }
}

impl From<PhaseCategory> for String {
    fn from(value: PhaseCategory) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PhaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PhaseCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PhaseCategory::from(s.to_string()))
    }
}

/// Status of a single phase or step, derived from its progress value.
/// Locking is a computed display signal and is never stored as a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkStatus::Pending => "pending",
            WorkStatus::InProgress => "in_progress",
            WorkStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteStatus {
    Awaiting,
    Active,
    Completed,
    Overdue,
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SiteStatus::Awaiting => "awaiting",
            SiteStatus::Active => "active",
            SiteStatus::Completed => "completed",
            SiteStatus::Overdue => "overdue",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// Optional attachment point for a gallery entry. A step is always addressed
/// through its owning phase; steps are not globally unique handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaTarget {
    Phase(PhaseId),
    Step { phase: PhaseId, step: StepId },
}
