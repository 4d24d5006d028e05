//! Structured error types for nim-backtrace
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! None of these cross the formatting entry points: they are turned into an
//! explanatory string or an empty result there.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BacktraceError {
    #[error("could not get the program's path on this platform: {0}")]
    PathDiscovery(String),

    #[error("symbolization backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("symbolization error: {message} ({errnum})")]
    Backend { message: String, errnum: i32 },
}

impl BacktraceError {
    /// Build a backend query error from an arbitrary source error
    pub fn backend(message: impl std::fmt::Display) -> Self {
        BacktraceError::Backend { message: message.to_string(), errnum: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BacktraceError::Backend { message: "no debug info".to_string(), errnum: -1 };
        assert_eq!(err.to_string(), "symbolization error: no debug info (-1)");
        assert_eq!(BacktraceError::backend("bad").to_string(), "symbolization error: bad (0)");
    }

    #[test]
    fn test_path_discovery_error() {
        let err = BacktraceError::PathDiscovery("unsupported".to_string());
        assert!(err.to_string().contains("program's path"));
    }
}
