//! Error types for failctl.

use thiserror::Error;

/// Result type alias for failctl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in failover operations.
#[derive(Error, Debug)]
pub enum Error {
    // Rejected decisions
    #[error("more than one eligible standby for {0}, manual resolution required")]
    AmbiguousCandidate(String),

    #[error("candidate region {0} is not confirmed healthy")]
    CandidateUnhealthy(String),

    #[error("promotion already in flight for {failed} -> {candidate}")]
    AlreadyInProgress { failed: String, candidate: String },

    #[error("region {0} is already primary")]
    AlreadyPrimary(String),

    #[error("candidate must differ from failed region: {0}")]
    SelfFailover(String),

    #[error("region {0} is not a standby")]
    NotStandby(String),

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("unknown failover group: {0}")]
    UnknownGroup(String),

    #[error("no eligible candidate for failed region {0}")]
    NoCandidate(String),

    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    // Collaborator errors
    #[error("collaborator call timed out after {0}ms")]
    CollaboratorTimeout(u64),

    #[error("collaborator error: {0}")]
    Collaborator(String),

    // Durability errors
    #[error("audit append failed: {0}")]
    Durability(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    // Generic errors
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable reason code, used in notifications and audit records.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Error::AmbiguousCandidate(_) => "AmbiguousCandidate",
            Error::CandidateUnhealthy(_) => "CandidateUnhealthy",
            Error::AlreadyInProgress { .. } => "AlreadyInProgress",
            Error::AlreadyPrimary(_) => "AlreadyPrimary",
            Error::SelfFailover(_) => "SelfFailover",
            Error::NotStandby(_) => "NotStandby",
            Error::UnknownRegion(_) => "UnknownRegion",
            Error::UnknownGroup(_) => "UnknownGroup",
            Error::NoCandidate(_) => "NoCandidate",
            Error::InvalidTransition(_) => "InvalidTransition",
            Error::CollaboratorTimeout(_) => "CollaboratorTimeout",
            Error::Collaborator(_) => "CollaboratorError",
            Error::Durability(_) => "DurabilityFailure",
            Error::Config(_) => "ConfigError",
            Error::Serialization(_) => "SerializationError",
            Error::Io(_) => "IoError",
        }
    }

    /// Whether this error represents a rejected decision (no state mutation).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::AmbiguousCandidate(_)
                | Error::CandidateUnhealthy(_)
                | Error::AlreadyInProgress { .. }
                | Error::AlreadyPrimary(_)
                | Error::SelfFailover(_)
                | Error::NotStandby(_)
                | Error::NoCandidate(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
