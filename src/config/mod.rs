//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (sources.rs)
//!     → layered with the YAML file named by <PREFIX>_CONFIG_PATH (config crate)
//!     → layered with <PREFIX>_* environment overrides (config crate)
//!     → RawValue tree, relative root anchored on the working directory (raw.rs)
//!     → field table walk, one hook chain per field (hooks.rs → crate::decode)
//!     → validation.rs (cross-field checks)
//!     → Config (typed, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once built; it holds no handle to its sources
//! - Precedence is environment over file over defaults, per leaf
//! - Assembly is fail-fast: the first error aborts it, wrapped with the field path
//! - Validation separates per-field checks (hooks) from cross-field checks

pub mod error;
pub mod hooks;
pub mod loader;
pub mod raw;
pub mod schema;
pub mod sources;
pub mod validation;

pub use error::DecodeError;
pub use loader::{build, build_from, ConfigError};
pub use schema::{AcmeConfig, Config, MetricsConfig, TlsConfig};
pub use sources::Environment;
