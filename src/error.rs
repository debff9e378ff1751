use thiserror::Error;

// =============================================================================
// Error kinds shared by every pattern program
// =============================================================================

/// Coarse classification used to decide whether an error is narrated and
/// ignored or carried to `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    PreconditionFailed,
    NotFound,
    AccessDenied,
    Exhausted,
    Fatal,
}

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Nothing to {0}")]
    Exhausted(String),

    #[error("Contract violation: {0}")]
    Fatal(String),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV failure: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON failure: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot encoding failure: {0}")]
    Encoding(#[from] bincode::Error),
}

pub type Result<T, E = PatternError> = std::result::Result<T, E>;

impl PatternError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// Rejection of a structural operation a participant does not offer,
    /// e.g. adding a child to a leaf.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::PreconditionFailed(format!("Operation not supported: {}", operation.into()))
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied(message.into())
    }

    pub fn exhausted(action: impl Into<String>) -> Self {
        Self::Exhausted(action.into())
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::Exhausted(_) => ErrorKind::Exhausted,
            Self::Fatal(_) | Self::Io(_) | Self::Csv(_) | Self::Json(_) | Self::Encoding(_) => {
                ErrorKind::Fatal
            }
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_pick_the_right_kind() {
        assert_eq!(PatternError::invalid_argument("x").kind(), ErrorKind::InvalidArgument);
        assert_eq!(PatternError::precondition("x").kind(), ErrorKind::PreconditionFailed);
        assert_eq!(PatternError::unsupported("add").kind(), ErrorKind::PreconditionFailed);
        assert_eq!(PatternError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(PatternError::access_denied("x").kind(), ErrorKind::AccessDenied);
        assert_eq!(PatternError::exhausted("undo").kind(), ErrorKind::Exhausted);
        assert_eq!(PatternError::fatal("x").kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_wrapped_failures_are_fatal() {
        let io = PatternError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(io.is_fatal());

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(PatternError::from(json).is_fatal());

        assert!(!PatternError::not_found("id 3").is_fatal());
    }

    #[test]
    fn test_messages() {
        assert_eq!(PatternError::exhausted("undo").to_string(), "Nothing to undo");
        assert_eq!(
            PatternError::unsupported("add on a file").to_string(),
            "Operation not supported: add on a file"
        );
        assert_eq!(
            PatternError::precondition("Insufficient funds").to_string(),
            "Insufficient funds"
        );
    }
}
