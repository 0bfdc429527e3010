//! Response compression level.
//!
//! Levels follow the gzip convention: `-1` selects the encoder default, `0`
//! disables compression and `1..=9` trade speed for ratio.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::config::error::DecodeError;
use crate::config::hooks::{FromRaw, Hooked};
use crate::config::raw::RawValue;

/// A gzip compression level in `-1..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Compression(i8);

const NAMES: [(&str, Compression); 4] = [
    ("none", Compression::NONE),
    ("default", Compression::DEFAULT),
    ("speed", Compression::SPEED),
    ("best", Compression::BEST),
];

impl Compression {
    pub const NONE: Self = Self(0);
    pub const DEFAULT: Self = Self(-1);
    pub const SPEED: Self = Self(1);
    pub const BEST: Self = Self(9);

    pub const MIN_LEVEL: i8 = -1;
    pub const MAX_LEVEL: i8 = 9;

    /// Range-checked construction. Out-of-range levels are rejected, never clamped.
    pub fn new(level: i128) -> Result<Self, DecodeError> {
        if level < i128::from(Self::MIN_LEVEL) || level > i128::from(Self::MAX_LEVEL) {
            return Err(DecodeError::UnsupportedCompression(level.to_string()));
        }
        // In range, so it fits an i8.
        Ok(Self(level as i8))
    }

    pub fn level(self) -> i8 {
        self.0
    }
}

impl FromStr for Compression {
    type Err = DecodeError;

    /// Accepts a level name or a decimal level, trimmed and case-insensitive.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let level = input.trim().to_lowercase();

        if let Some((_, compression)) = NAMES.iter().find(|(name, _)| *name == level) {
            return Ok(*compression);
        }

        match level.parse::<i128>() {
            Ok(number) => Self::new(number),
            Err(_) => Err(DecodeError::UnsupportedCompression(level)),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match NAMES.iter().find(|(_, c)| c == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Compression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.0)
    }
}

impl FromRaw for Compression {
    const EXPECTED: &'static str = "compression level name or integer";
}

/// Hook for `(string, Compression)`.
pub fn from_str(raw: &RawValue) -> Result<Hooked<Compression>, DecodeError> {
    match raw {
        RawValue::Str(s) => s.parse().map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

/// Hook for `(integer, Compression)`.
pub fn from_int(raw: &RawValue) -> Result<Hooked<Compression>, DecodeError> {
    match raw {
        RawValue::Int(n) => Compression::new(*n).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}
