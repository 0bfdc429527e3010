//! Decode error taxonomy.
//!
//! Every hook reports one of these. The assembler wraps them with the dotted
//! field path in [`ConfigError::Field`](crate::config::loader::ConfigError::Field).

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::raw::{RawValue, Shape, YamlError};

/// Which stage of the two-stage PEM loader failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PemStage {
    Inline,
    File(PathBuf),
}

impl fmt::Display for PemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PemStage::Inline => f.write_str("inline PEM"),
            PemStage::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// Coarse error class, one per failure family of the decoding pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The hook could not interpret the input representation.
    Shape,
    /// The value parsed but broke a domain rule.
    Validation,
    /// PEM or X.509 material could not be read or parsed.
    Cryptographic,
}

/// A single hook failure.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected {expected}, got {actual}")]
    Shape {
        expected: &'static str,
        actual: Shape,
    },

    #[error("expected string at index {index}, got {actual}")]
    ListItem { index: usize, actual: Shape },

    #[error("invalid {expected}: {value:?}")]
    Scalar {
        expected: &'static str,
        value: String,
    },

    #[error("failed to resolve root '{path}': {source}")]
    RootUnresolvable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("root is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("unsupported compression level: {0} (valid range: -1 to 9)")]
    UnsupportedCompression(String),

    #[error("failed to parse headers YAML from string: {0}")]
    HeadersYaml(#[source] YamlError),

    #[error("invalid header key: {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid header value for key '{name}': {reason}")]
    InvalidHeaderValue { name: String, reason: String },

    #[error("unsupported TLS version: {0}")]
    UnsupportedTlsVersion(String),

    #[error("unsupported TLS curve: {0:?}")]
    UnsupportedCurve(String),

    #[error("duplicate TLS curves: {0}")]
    DuplicateCurve(String),

    #[error("unsupported TLS cipher suite: {0:?}")]
    UnsupportedCipher(String),

    #[error("duplicate TLS cipher suite: {0}")]
    DuplicateCipher(String),

    #[error("certificate file not found or unreadable: {}: {source}", .path.display())]
    CertificateUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid certificate content ({stage}): {reason}")]
    InvalidCertificate { stage: PemStage, reason: String },

    #[error("private key file not found or unreadable: {}: {source}", .path.display())]
    PrivateKeyUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse private key ({stage}): {reason}")]
    InvalidPrivateKey { stage: PemStage, reason: String },

    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("invalid ACME URL {value:?}: {source}")]
    InvalidAcmeUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid domain name: {0:?}")]
    InvalidDomain(String),

    #[error("duplicate domain name: {0}")]
    DuplicateDomain(String),

    #[error("invalid ACME challenge path: {reason}: {value:?}")]
    InvalidChallengePath { value: String, reason: &'static str },
}

impl DecodeError {
    /// Shape mismatch between what a decoder accepts and what the source held.
    pub fn shape(expected: &'static str, raw: &RawValue) -> Self {
        DecodeError::Shape {
            expected,
            actual: raw.shape(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            DecodeError::Shape { .. }
            | DecodeError::ListItem { .. }
            | DecodeError::HeadersYaml(_) => ErrorClass::Shape,
            DecodeError::CertificateUnreadable { .. }
            | DecodeError::InvalidCertificate { .. }
            | DecodeError::PrivateKeyUnreadable { .. }
            | DecodeError::InvalidPrivateKey { .. } => ErrorClass::Cryptographic,
            _ => ErrorClass::Validation,
        }
    }
}
