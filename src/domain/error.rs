//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent business rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown solution: {0}")]
    UnknownSolution(String),

    #[error("invalid partner type: {0} (expected All, Managed or Unmanaged)")]
    InvalidPartnerType(String),

    #[error("invalid profile breakdown entry: {0}")]
    InvalidBreakdown(String),

    #[error("baseline column is not a solution|product|tier triple: {0}")]
    InvalidColumnLabel(String),
}
