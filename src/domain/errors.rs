use super::validation::ValidationErrors;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("Deal not found: {0}")]
    DealNotFound(String),
    #[error("Administrator access required")]
    Unauthorized,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Why the identity provider refused a login or signup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account already exists for {0}")]
    EmailTaken(String),
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("Failed to deliver verification email to {email}: {reason}")]
    Delivery { email: String, reason: String },
}
