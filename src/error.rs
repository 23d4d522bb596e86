//! Error taxonomy for the build environment lifecycle.
//!
//! The variants stay distinct inside the library; the CLI collapses them to
//! the historic exit-code surface (1 for usage, unknown actions, key import,
//! native bootstrap and publish failures; 2 and 3 for the two foreign
//! bootstrap phases).

use std::fmt;

/// Bootstrap phase that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Single-phase debootstrap for a native architecture.
    Native,
    /// Unpack-only first phase for a foreign architecture.
    ForeignUnpack,
    /// Chrooted second stage completing a foreign bootstrap.
    SecondStage,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Native => "native debootstrap",
            Stage::ForeignUnpack => "foreign unpack",
            Stage::SecondStage => "second stage",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    #[error("key import failed: {0}")]
    KeyImport(String),

    #[error("bootstrap failed ({stage}): {message}")]
    Bootstrap { stage: Stage, message: String },

    #[error("publish failed: {0}")]
    Publish(String),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Native bootstrap failures share code 1 with usage errors; the
    /// original tool used the same overloaded surface and downstream
    /// callers depend on it.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Bootstrap {
                stage: Stage::ForeignUnpack,
                ..
            } => 2,
            Error::Bootstrap {
                stage: Stage::SecondStage,
                ..
            } => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_match_surface() {
        assert_eq!(Error::Usage("bad".into()).exit_code(), 1);
        assert_eq!(Error::UnknownAction("frobnicate".into()).exit_code(), 1);
        assert_eq!(Error::KeyImport("gpg".into()).exit_code(), 1);
        assert_eq!(Error::Publish("tar".into()).exit_code(), 1);
        let bootstrap = |stage| Error::Bootstrap {
            stage,
            message: String::new(),
        };
        assert_eq!(bootstrap(Stage::Native).exit_code(), 1);
        assert_eq!(bootstrap(Stage::ForeignUnpack).exit_code(), 2);
        assert_eq!(bootstrap(Stage::SecondStage).exit_code(), 3);
    }
}
