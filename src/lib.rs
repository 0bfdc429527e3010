//! Typed configuration for the static file server.
//!
//! Layers built-in defaults, an optional YAML file and environment variables,
//! then decodes every field into a domain type (filesystem root, header set,
//! compression level, TLS parameters, PEM material, ACME fields).
//!
//! ```no_run
//! let config = gss_config::build()?;
//! println!("serving {} on port {}", config.root.as_path().display(), config.port);
//! # Ok::<(), gss_config::ConfigError>(())
//! ```

pub mod config;
pub mod decode;
pub mod observability;

pub use crate::config::{build, build_from, Config, ConfigError, Environment};
