//! Server error types.

use std::fmt;

/// Errors that can occur in the route server.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error (invalid bind address, unusable upstream URL).
    ///
    /// Fatal at startup. Fix configuration and restart.
    Config(String),

    /// Listener or socket failure.
    ///
    /// May be transient (accept errors) or fatal (bind address in use).
    Transport(String),

    /// The routing provider could not be reached or answered garbage.
    ///
    /// Fails the current request only; reported to the caller as a gateway
    /// error.
    Upstream(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Upstream(msg) => write!(f, "upstream error: {msg}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_layer() {
        assert_eq!(ServerError::Config("no key".into()).to_string(), "configuration error: no key");
        assert_eq!(ServerError::Upstream("timeout".into()).to_string(), "upstream error: timeout");
    }

    #[test]
    fn io_errors_are_transport() {
        let err: ServerError = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use").into();
        assert!(matches!(err, ServerError::Transport(_)));
    }
}
