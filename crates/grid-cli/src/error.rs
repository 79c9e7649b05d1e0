//! CLI error types.

use std::fmt;

use grid_accounting::AccountingError;
use grid_core::GridError;
use grid_lifecycle::LifecycleError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration.
    Config(String),
    /// Snapshot could not be read or written.
    Snapshot(String),
    /// Accounting failed.
    Accounting(AccountingError),
    /// The reservation did not deploy.
    Lifecycle(LifecycleError),
    /// Output formatting error.
    Format(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Snapshot(msg) => write!(f, "snapshot error: {msg}"),
            Self::Accounting(e) => write!(f, "accounting error: {e}"),
            Self::Lifecycle(e) => match e.report() {
                Some(report) => write!(f, "{e}\n\n{report}"),
                None => write!(f, "{e}"),
            },
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Accounting(e) => Some(e),
            Self::Lifecycle(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<AccountingError> for CliError {
    fn from(err: AccountingError) -> Self {
        Self::Accounting(err)
    }
}

impl From<LifecycleError> for CliError {
    fn from(err: LifecycleError) -> Self {
        Self::Lifecycle(err)
    }
}

impl From<GridError> for CliError {
    fn from(err: GridError) -> Self {
        Self::Accounting(err.into())
    }
}
