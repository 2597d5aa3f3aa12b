//! `RevisionSource` over a directory of `*.sql` scripts, using `cap_std`.

use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use cap_std::fs::{Dir, OpenOptions};
use cap_std::ambient_authority;
use tracing::debug;

use crate::domain::ports::{RevisionFile, RevisionSource, RevisionSourceError};

const SCRIPT_EXTENSION: &str = ".sql";

/// Revision scripts stored in a directory (default `migrations/`).
#[derive(Debug, Clone)]
pub struct FileRevisionSource {
    root: PathBuf,
}

impl FileRevisionSource {
    /// Source reading scripts from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the scripts.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn display(&self, name: &str) -> String {
        self.root.join(name).display().to_string()
    }

    fn directory_error(&self, error: &std::io::Error) -> RevisionSourceError {
        RevisionSourceError::directory(self.root.display().to_string(), error.to_string())
    }
}

impl RevisionSource for FileRevisionSource {
    fn load(&self) -> Result<Vec<RevisionFile>, RevisionSourceError> {
        let dir = Dir::open_ambient_dir(&self.root, ambient_authority())
            .map_err(|err| self.directory_error(&err))?;

        let mut names = Vec::new();
        for entry in dir.entries().map_err(|err| self.directory_error(&err))? {
            let entry = entry.map_err(|err| self.directory_error(&err))?;
            let is_file = entry
                .file_type()
                .map_err(|err| self.directory_error(&err))?
                .is_file();
            let Ok(name) = entry.file_name().into_string() else {
                debug!(root = %self.root.display(), "skipping non UTF-8 file name");
                continue;
            };
            if is_file && name.ends_with(SCRIPT_EXTENSION) {
                names.push(name);
            }
        }
        names.sort();

        names
            .into_iter()
            .map(|name| {
                let contents = dir.read_to_string(&name).map_err(|err| {
                    RevisionSourceError::read(self.display(&name), err.to_string())
                })?;
                Ok(RevisionFile { name, contents })
            })
            .collect()
    }

    fn create(&self, name: &str, contents: &str) -> Result<String, RevisionSourceError> {
        Dir::create_ambient_dir_all(&self.root, ambient_authority())
            .map_err(|err| self.directory_error(&err))?;
        let dir = Dir::open_ambient_dir(&self.root, ambient_authority())
            .map_err(|err| self.directory_error(&err))?;

        let path = self.display(name);
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        let mut file = dir.open_with(name, &options).map_err(|err| {
            if err.kind() == ErrorKind::AlreadyExists {
                RevisionSourceError::already_exists(path.clone())
            } else {
                RevisionSourceError::write(path.clone(), err.to_string())
            }
        })?;
        file.write_all(contents.as_bytes())
            .map_err(|err| RevisionSourceError::write(path.clone(), err.to_string()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn scripts_dir() -> TempDir {
        tempfile::tempdir().expect("temporary directory")
    }

    #[rstest]
    fn load_returns_sql_files_sorted(scripts_dir: TempDir) {
        let source = FileRevisionSource::new(scripts_dir.path());
        source.create("b_second.sql", "-- b").expect("write b");
        source.create("a_first.sql", "-- a").expect("write a");
        std::fs::write(scripts_dir.path().join("README.md"), "notes").expect("write readme");
        std::fs::create_dir(scripts_dir.path().join("nested.sql")).expect("create dir");

        let files = source.load().expect("scripts load");

        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a_first.sql", "b_second.sql"]);
        assert_eq!(files[0].contents, "-- a");
    }

    #[rstest]
    fn create_refuses_to_overwrite(scripts_dir: TempDir) {
        let source = FileRevisionSource::new(scripts_dir.path());
        source.create("a.sql", "-- first").expect("first write");

        let err = source.create("a.sql", "-- second").expect_err("duplicate");

        assert!(matches!(err, RevisionSourceError::AlreadyExists { .. }));
        let files = source.load().expect("scripts load");
        assert_eq!(files[0].contents, "-- first");
    }

    #[rstest]
    fn create_makes_missing_directory(scripts_dir: TempDir) {
        let root = scripts_dir.path().join("versions");
        let source = FileRevisionSource::new(&root);

        let path = source.create("a.sql", "-- a").expect("write");

        assert!(path.ends_with("a.sql"));
        assert!(root.join("a.sql").is_file());
    }

    #[rstest]
    fn missing_directory_is_reported(scripts_dir: TempDir) {
        let source = FileRevisionSource::new(scripts_dir.path().join("absent"));
        assert!(matches!(
            source.load(),
            Err(RevisionSourceError::Directory { .. })
        ));
    }
}
