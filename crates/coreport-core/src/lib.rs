use std::path::{Path, PathBuf};

pub mod config;
pub mod dictionary;
pub mod git;
pub mod metadata;
pub mod porter;
pub mod renamer;
pub mod runner;
pub mod tree;

pub use config::{Config, RenameRule};
pub use porter::{PortOptions, PortReport, Porter};
pub use renamer::{PendingRename, RenamePlan, RenameReport, Renamer};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};

#[derive(thiserror::Error, Debug)]
pub enum PortError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    #[error("Filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot rename {from:?}: destination {to:?} already exists")]
    DestinationExists { from: PathBuf, to: PathBuf },
    #[error("Precondition failed: {message}")]
    Precondition { message: String },
    #[error("Command `{command}` failed: {message}")]
    Command { command: String, message: String },
    #[error("Cancelled: {message}")]
    Cancelled { message: String },
}

pub type Result<T, E = PortError> = std::result::Result<T, E>;

impl PortError {
    pub fn configuration(message: impl Into<String>) -> Self {
        PortError::Configuration {
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        PortError::Precondition {
            message: message.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        PortError::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Attaches the offending path to an `io::Result`.
pub(crate) trait IoResultExt<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|e| PortError::io(path, e))
    }
}

impl From<walkdir::Error> for PortError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
        PortError::Filesystem { path, source }
    }
}
