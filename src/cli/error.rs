//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),

    #[error("refresh skipped at {stage} stage: {reason}")]
    RefreshSkipped { stage: String, reason: String },
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::from(e).into()
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::RefreshSkipped { .. } => crate::exitcode::UNAVAILABLE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Serialization { .. } => crate::exitcode::SOFTWARE,
                InfraError::Application(e) => match e {
                    ApplicationError::Domain(_) => crate::exitcode::USAGE,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::MissingSource { .. }
                    | ApplicationError::CacheMissing(_) => crate::exitcode::NOINPUT,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_error_kinds_when_mapping_then_sysexits_codes() {
        let missing: CliError = ApplicationError::CacheMissing("cache.json".into()).into();
        assert_eq!(missing.exit_code(), crate::exitcode::NOINPUT);

        let config: CliError = ApplicationError::Config {
            message: "bad".into(),
        }
        .into();
        assert_eq!(config.exit_code(), crate::exitcode::CONFIG);

        let domain: CliError = DomainError::InvalidPartnerType("x".into()).into();
        assert_eq!(domain.exit_code(), crate::exitcode::USAGE);

        let skipped = CliError::RefreshSkipped {
            stage: "directory".into(),
            reason: "gone".into(),
        };
        assert_eq!(skipped.exit_code(), crate::exitcode::UNAVAILABLE);

        let usage = CliError::Usage("config already exists".into());
        assert_eq!(usage.exit_code(), crate::exitcode::USAGE);
        assert_ne!(usage.exit_code(), crate::exitcode::OK);
    }
}
