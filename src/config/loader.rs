//! Configuration assembly.
//!
//! Defaults, then the optional YAML file, then the environment, decoded
//! into a [`Config`] and checked for cross-field consistency.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::error::DecodeError;
use crate::config::hooks;
use crate::config::raw::Shape;
use crate::config::schema::Config;
use crate::config::sources::{self, Environment};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration assembly.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine the working directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to layer configuration sources: {0}")]
    Sources(#[from] ::config::ConfigError),

    #[error("expected mapping at '{path}', got {found}")]
    NotAMapping { path: String, found: Shape },

    #[error("failed to decode '{path}': {source}")]
    Field {
        path: &'static str,
        #[source]
        source: DecodeError,
    },

    #[error("missing required field '{0}'")]
    Missing(&'static str),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Assemble from the process environment and working directory.
pub fn build() -> Result<Config, ConfigError> {
    let cwd = env::current_dir().map_err(ConfigError::CurrentDir)?;
    build_from(&Environment::from_process(), &cwd)
}

/// Assemble from an explicit environment. `cwd` anchors the default root,
/// a relative root and a relative config file path.
pub fn build_from(env: &Environment, cwd: &Path) -> Result<Config, ConfigError> {
    let prefix = sources::env_prefix(env);
    let config_path = sources::config_path(env, &prefix, cwd);
    debug!(prefix = %prefix, config_path = ?config_path, "assembling configuration");

    let overrides = sources::env_overrides(env, &prefix, hooks::field_paths());
    debug!(overrides = overrides.len(), "environment overrides collected");

    let defaults = sources::defaults(cwd);
    let mut tree = sources::layer(&defaults, config_path.as_deref(), &prefix, overrides)?;
    sources::anchor_root(&mut tree, cwd);

    let config = hooks::decode(&tree)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    info!(
        port = config.port,
        root = %config.root.as_path().display(),
        compression = %config.compression,
        tls = config.tls.is_enabled(),
        acme = config.tls.acme.enabled,
        metrics = config.metrics.enabled,
        "configuration loaded"
    );

    Ok(config)
}
