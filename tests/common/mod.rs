//! Shared utilities for configuration assembly tests.

use std::fs;
use std::path::{Path, PathBuf};

use gss_config::Environment;
use tempfile::TempDir;

pub const CERT: &str = include_str!("../fixtures/cert.pem");
pub const EC_KEY: &str = include_str!("../fixtures/ec_sec1.pem");
#[allow(dead_code)]
pub const RSA_KEY: &str = include_str!("../fixtures/rsa_pkcs1.pem");

/// A scratch directory that doubles as the working directory of an assembly.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` inside the workspace and return the full path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }
}

/// Build an [`Environment`] from literal pairs.
pub fn env(vars: &[(&str, &str)]) -> Environment {
    vars.iter().copied().collect()
}
