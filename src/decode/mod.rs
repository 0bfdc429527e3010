//! Typed decoders.
//!
//! # Data Flow
//! ```text
//! RawValue (one field of the merged tree)
//!     → hook chain for the field (hooks.rs)
//!     → primitive decoder (root, compression, tls, acme)
//!       or composite decoder (headers, pem)
//!     → typed value stored in Config
//! ```
//!
//! # Design Decisions
//! - Each decoder is exposed twice: a typed parse function for direct use and
//!   one hook per accepted source shape for the registry
//! - Hooks decline shapes they do not own instead of failing
//! - Only the PEM decoders touch the filesystem besides root resolution

pub mod acme;
pub mod compression;
pub mod headers;
pub mod pem;
pub mod root;
pub mod tls;

use crate::config::error::DecodeError;
use crate::config::raw::RawValue;

/// Items of a comma-separated string. Empty items are kept so the caller rejects them.
pub(crate) fn csv_items(input: &str) -> Vec<&str> {
    input.split(',').collect()
}

/// Items of a list that must hold only strings.
pub(crate) fn list_items(items: &[RawValue]) -> Result<Vec<&str>, DecodeError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str().ok_or(DecodeError::ListItem {
                index,
                actual: item.shape(),
            })
        })
        .collect()
}
