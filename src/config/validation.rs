//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic checks that span more than one field (hooks check single fields)
//! - Version bounds, certificate/key pairing, ACME prerequisites, port clashes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>
//! - Runs after decoding, before the config is handed to the server

use thiserror::Error;

use crate::config::schema::Config;
use crate::decode::tls::ProtocolVersion;

/// A rule broken by a combination of fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("tls.minVersion {min} is above tls.maxVersion {max}")]
    VersionRange {
        min: ProtocolVersion,
        max: ProtocolVersion,
    },

    #[error("tls.{present} is set without tls.{missing}")]
    IncompletePair {
        present: &'static str,
        missing: &'static str,
    },

    #[error("tls.ca requires tls.crt and tls.key")]
    CaWithoutCertificate,

    #[error("tls.acme.enabled requires tls.acme.{0}")]
    AcmeIncomplete(&'static str),

    #[error("metrics.metricsPort {0} is the same as port")]
    PortClash(u16),
}

/// Check every cross-field rule and report all violations.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let tls = &config.tls;

    if let Some(max) = tls.max_version {
        if tls.min_version > max {
            errors.push(ValidationError::VersionRange {
                min: tls.min_version,
                max,
            });
        }
    }

    match (&tls.certificate, &tls.key) {
        (Some(_), None) => errors.push(ValidationError::IncompletePair {
            present: "crt",
            missing: "key",
        }),
        (None, Some(_)) => errors.push(ValidationError::IncompletePair {
            present: "key",
            missing: "crt",
        }),
        _ => {}
    }

    if tls.ca.is_some() && (tls.certificate.is_none() || tls.key.is_none()) {
        errors.push(ValidationError::CaWithoutCertificate);
    }

    if tls.acme.enabled {
        if tls.acme.email.is_none() {
            errors.push(ValidationError::AcmeIncomplete("email"));
        }
        if tls.acme.domains.is_empty() {
            errors.push(ValidationError::AcmeIncomplete("domains"));
        }
    }

    if config.metrics.enabled && config.metrics.metrics_port == config.port {
        errors.push(ValidationError::PortClash(config.port));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
