//! Static file root.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::config::error::DecodeError;
use crate::config::hooks::{FromRaw, Hooked};
use crate::config::raw::RawValue;

/// A canonical, absolute path to a directory that existed when it was decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilesystemRoot(pub(crate) PathBuf);

impl FilesystemRoot {
    /// Resolve symlinks and `.`/`..`, then require a directory.
    ///
    /// Relative inputs resolve against the process working directory. Assembly
    /// joins them onto its own `cwd` before they get here.
    pub fn resolve(input: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let input = input.as_ref();
        let path = fs::canonicalize(input).map_err(|source| DecodeError::RootUnresolvable {
            path: input.display().to_string(),
            source,
        })?;

        if !path.is_dir() {
            return Err(DecodeError::RootNotDirectory(path));
        }
        Ok(Self(path))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for FilesystemRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Serialize for FilesystemRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl FromRaw for FilesystemRoot {
    const EXPECTED: &'static str = "directory path string";
}

/// Hook for `(string, FilesystemRoot)`.
pub fn from_str(raw: &RawValue) -> Result<Hooked<FilesystemRoot>, DecodeError> {
    match raw {
        RawValue::Str(s) => FilesystemRoot::resolve(s).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_segments_collapse() {
        let root = FilesystemRoot::resolve("/tmp/../tmp").unwrap();
        assert_eq!(root.as_path(), fs::canonicalize("/tmp").unwrap());
    }

    #[test]
    fn test_symlink_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let root = FilesystemRoot::resolve(&link).unwrap();
        assert_eq!(root.as_path(), fs::canonicalize(&target).unwrap());
    }

    #[test]
    fn test_missing_path_rejected() {
        let err = FilesystemRoot::resolve("/definitely/not/here").unwrap_err();
        assert!(matches!(err, DecodeError::RootUnresolvable { .. }));
    }

    #[test]
    fn test_file_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = FilesystemRoot::resolve(file.path()).unwrap_err();
        assert!(err.to_string().contains("root is not a directory"));
    }

    #[test]
    fn test_hook_declines_non_strings() {
        assert!(matches!(
            from_str(&RawValue::Int(100)).unwrap(),
            Hooked::NotApplicable
        ));
    }
}
