//! Configuration schema definitions.
//!
//! The typed result of assembly. Every field holds a decoded domain value;
//! nothing here is a raw string waiting to be parsed later.

use std::path::PathBuf;

use serde::Serialize;

use crate::decode::acme::{AcmeChallengePath, AcmeDomains, AcmeEmail, AcmeUrl};
use crate::decode::compression::Compression;
use crate::decode::headers::HeaderSet;
use crate::decode::pem::{Certificate, PrivateKey};
use crate::decode::root::FilesystemRoot;
use crate::decode::tls::{CipherSuiteSet, CurveSet, ProtocolVersion};

/// Root configuration for the static file server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Directory files are served from.
    pub root: FilesystemRoot,

    /// Listening port.
    pub port: u16,

    /// Headers added to every response.
    pub headers: HeaderSet,

    pub compression: Compression,

    pub tls: TlsConfig,

    pub metrics: MetricsConfig,
}

/// TLS listener settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    #[serde(rename = "crt")]
    pub certificate: Option<Certificate>,

    pub key: Option<PrivateKey>,

    /// Client CA. Setting it turns on client certificate verification.
    pub ca: Option<Certificate>,

    pub min_version: ProtocolVersion,

    /// `None` means the highest version the TLS stack supports.
    pub max_version: Option<ProtocolVersion>,

    pub curves: CurveSet,

    pub ciphers: CipherSuiteSet,

    pub acme: AcmeConfig,
}

impl TlsConfig {
    /// TLS is served when a certificate is configured or ACME provisions one.
    pub fn is_enabled(&self) -> bool {
        self.certificate.is_some() || self.acme.enabled
    }

    /// Whether clients must present a certificate signed by [`TlsConfig::ca`].
    pub fn verifies_clients(&self) -> bool {
        self.ca.is_some()
    }
}

/// ACME certificate provisioning.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcmeConfig {
    pub enabled: bool,
    pub email: Option<AcmeEmail>,
    pub url: Option<AcmeUrl>,
    pub domains: AcmeDomains,
    pub challenge_path: Option<AcmeChallengePath>,
}

/// Metrics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfig {
    pub enabled: bool,
    pub metrics_port: u16,
}

impl Config {
    /// Placeholder values the decoder overwrites field by field.
    ///
    /// Required fields are always replaced; only the optional and
    /// defaulted ones can keep what is set here.
    pub(crate) fn skeleton() -> Self {
        Self {
            root: FilesystemRoot(PathBuf::new()),
            port: 0,
            headers: HeaderSet::new(),
            compression: Compression::DEFAULT,
            tls: TlsConfig {
                certificate: None,
                key: None,
                ca: None,
                min_version: ProtocolVersion::Tls12,
                max_version: None,
                curves: CurveSet::default(),
                ciphers: CipherSuiteSet::default(),
                acme: AcmeConfig {
                    enabled: false,
                    email: None,
                    url: None,
                    domains: AcmeDomains::default(),
                    challenge_path: None,
                },
            },
            metrics: MetricsConfig {
                enabled: false,
                metrics_port: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_enabled_by_acme_or_certificate() {
        let mut config = Config::skeleton();
        assert!(!config.tls.is_enabled());

        config.tls.acme.enabled = true;
        assert!(config.tls.is_enabled());
        assert!(!config.tls.verifies_clients());
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(Config::skeleton()).unwrap();
        assert!(json["tls"].get("minVersion").is_some());
        assert!(json["tls"].get("crt").is_some());
        assert!(json["tls"]["acme"].get("challengePath").is_some());
        assert!(json["metrics"].get("metricsPort").is_some());
    }
}
