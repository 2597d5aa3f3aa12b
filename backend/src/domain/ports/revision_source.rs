//! Driven port over the directory holding revision scripts.

use super::define_port_error;

define_port_error! {
    /// Failures raised while reading or writing revision scripts.
    pub enum RevisionSourceError {
        /// The scripts directory could not be opened or listed.
        Directory { path: String, message: String } => "cannot access revision directory {path}: {message}",
        /// A script could not be read.
        Read { path: String, message: String } => "cannot read revision script {path}: {message}",
        /// A script could not be written.
        Write { path: String, message: String } => "cannot write revision script {path}: {message}",
        /// Refused to overwrite an existing script.
        AlreadyExists { path: String } => "revision script {path} already exists",
    }
}

/// Raw contents of one revision script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionFile {
    pub name: String,
    pub contents: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait RevisionSource: Send + Sync {
    /// Every `*.sql` script, sorted by file name.
    fn load(&self) -> Result<Vec<RevisionFile>, RevisionSourceError>;

    /// Create a new script, returning its path for display.
    fn create(&self, name: &str, contents: &str) -> Result<String, RevisionSourceError>;
}
