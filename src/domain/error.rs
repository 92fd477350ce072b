use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Write failed: {0}")]
    WriteFailed(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures reported by a [`MemberRepository`](crate::domain::repository::MemberRepository).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate value violates unique constraint on {field}")]
    UniqueViolation { field: &'static str },
    #[error("row does not exist")]
    Missing,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
