use thiserror::Error;
use uuid::Uuid;

pub type GuardResult<T> = Result<T, GuardError>;

/// Faults raised by the compliance core.
///
/// Domain outcomes (banned phrases, missing certifications, failed rule
/// checks) are returned as data and never appear here.
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unknown certification kind: {0}")]
    UnknownCertification(String),

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Invalid transition: cannot {action} a campaign in status {from}")]
    InvalidTransition { from: String, action: String },

    #[error("Approval blocked: {}", .0.join("; "))]
    ApprovalBlocked(Vec<String>),

    #[error("Write conflict: campaign {campaign_id} was modified concurrently")]
    Conflict { campaign_id: Uuid },

    #[error("Campaign {0} not found")]
    NotFound(Uuid),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for GuardError {
    fn from(err: config::ConfigError) -> Self {
        GuardError::Config(err.to_string())
    }
}
