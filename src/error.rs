//! Error type shared by the run engine, the resolver and the completion engine.
//!
//! Every failure carries its own exit code, so callers never have to consult
//! a separate error-code channel. Hooks and handlers return `anyhow::Result`;
//! an [`Error`] wrapped inside an `anyhow::Error` keeps its code when it
//! comes back through [`Error::from_anyhow`].

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A flag survived parsing and ended up first in the positional tail.
    #[error("Invalid argument or argument order: {0}")]
    InvalidArgument(String),

    #[error("Unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("Unable to load subcommand {name}: {cause}")]
    LoadSubcommand { name: String, cause: String },

    #[error("Invalid option rule \"{decl}\": {reason}")]
    InvalidRule { decl: String, reason: String },

    /// Raised by a hook or handler that wants a specific exit code.
    #[error("{message}")]
    Failed { code: i32, message: String },

    #[error(transparent)]
    Other(anyhow::Error),
}

impl Error {
    /// Build an error that terminates the invocation with `code`.
    pub fn failed(code: i32, message: impl Into<String>) -> Self {
        Error::Failed {
            code,
            message: message.into(),
        }
    }

    pub fn load(name: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Error::LoadSubcommand {
            name: name.into(),
            cause: cause.to_string(),
        }
    }

    /// Exit code an invocation ending with this error terminates with.
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) | Error::UnknownSubcommand(_) => 1,
            Error::LoadSubcommand { .. } | Error::InvalidRule { .. } => 2,
            Error::Failed { code, .. } => *code,
            Error::Other(_) => 1,
        }
    }

    /// Recover a typed error from a hook/handler failure, keeping its code.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(inner) => inner,
            Err(other) => Error::Other(other),
        }
    }
}

/* --------------------------------- Tests ---------------------------------- */
