//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config::loader, decode::pem
//!     → tracing events (debug: sources and PEM file fallback, info: loaded summary)
//!     → logging.rs subscriber (stderr, RUST_LOG filter)
//! ```
//!
//! # Design Decisions
//! - Key material and inline PEM never appear in events
//! - Structured fields rather than formatted strings

pub mod logging;
