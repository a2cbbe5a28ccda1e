use thiserror::Error;

/// Failure kinds of the engine. The validation variants (`NotFound`,
/// `LockedDependency`, `InvalidTarget`) are deterministic and raised before
/// any write is attempted; `Persistence` is the only kind that can surface
/// after validation has passed.
#[derive(Error, Debug)]
pub enum WorksiteError {
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("{what} {id} is locked: its predecessor has not reached 100%")]
    LockedDependency { what: &'static str, id: String },

    #[error("phase {id} owns {step_count} steps; its progress is derived and cannot be set directly")]
    InvalidTarget { id: String, step_count: usize },

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorksiteError {
    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }

    pub fn locked(what: &'static str, id: impl ToString) -> Self {
        Self::LockedDependency {
            what,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorksiteError>;
