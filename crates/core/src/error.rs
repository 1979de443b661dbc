//! Error types for SquadUp Core

use thiserror::Error;

/// State-dependent conflicts (HTTP 409 class)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    #[error("user already joined this ticket")]
    AlreadyJoined,

    #[error("ticket is already full")]
    TicketFull,

    #[error("ticket is closed")]
    TicketClosed,

    #[error("closed tickets cannot be reopened")]
    CannotReopen,

    #[error("ticket already closed")]
    AlreadyClosed,

    #[error("vote already cast for this player on this ticket")]
    DuplicateVote,
}

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range input; the caller must fix and resend.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Authenticated but not authorized for this resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Precondition on current state failed.
    #[error("conflict: {0}")]
    Conflict(Conflict),

    /// Vote operation against a closed/ended ticket.
    #[error("gone: {0}")]
    Gone(String),

    /// Store failure, distinct from any business-rule conflict.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Business-rule failures are descriptive and safe to show to callers;
    /// everything else is infrastructure and should be reported generically.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::NotFound(_)
                | Self::Forbidden(_)
                | Self::Conflict(_)
                | Self::Gone(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_classification() {
        assert!(Error::Conflict(Conflict::TicketFull).is_business());
        assert!(Error::Gone("ticket closed".into()).is_business());
        assert!(!Error::Database(rusqlite::Error::QueryReturnedNoRows).is_business());
    }

    #[test]
    fn test_conflict_messages() {
        assert_eq!(
            Error::Conflict(Conflict::CannotReopen).to_string(),
            "conflict: closed tickets cannot be reopened"
        );
    }
}
