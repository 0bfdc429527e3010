//! Hook registry and dispatcher.
//!
//! # Responsibilities
//! - Define the tagged hook result and the hook signature
//! - Hold one hook chain per target type and one entry per configuration field
//! - Walk the merged tree and fill a [`Config`]
//!
//! # Design Decisions
//! - The field table is static and keyed by dotted path; the environment
//!   variable names are derived from the same table
//! - A hook that does not own the source shape returns
//!   [`Hooked::NotApplicable`]; the first hook that decodes wins
//! - When every hook declines, structural decoding ([`FromRaw::from_raw`])
//!   runs. For domain types that is a shape error
//! - Errors are wrapped with the field path before they leave this module

use crate::config::error::DecodeError;
use crate::config::loader::ConfigError;
use crate::config::raw::RawValue;
use crate::config::schema::Config;
use crate::decode::acme::{self, AcmeChallengePath, AcmeDomains, AcmeEmail, AcmeUrl};
use crate::decode::compression::{self, Compression};
use crate::decode::headers::{self, HeaderSet};
use crate::decode::pem::{self, Certificate, PrivateKey};
use crate::decode::root::{self, FilesystemRoot};
use crate::decode::tls::{self, CipherSuiteSet, CurveSet, ProtocolVersion};

/// Outcome of a single hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hooked<T> {
    Decoded(T),
    /// The hook does not handle this source shape.
    NotApplicable,
}

/// A conversion from one source shape to one target type.
pub type Hook<T> = fn(&RawValue) -> Result<Hooked<T>, DecodeError>;

/// Structural decoding, used when no hook applies.
pub trait FromRaw: Sized {
    /// Shape description used in error messages.
    const EXPECTED: &'static str;

    fn from_raw(raw: &RawValue) -> Result<Self, DecodeError> {
        Err(DecodeError::shape(Self::EXPECTED, raw))
    }
}

impl FromRaw for u16 {
    const EXPECTED: &'static str = "port number";

    fn from_raw(raw: &RawValue) -> Result<Self, DecodeError> {
        let out_of_range = |value: String| DecodeError::Scalar {
            expected: Self::EXPECTED,
            value,
        };
        match raw {
            RawValue::Int(n) => u16::try_from(*n).map_err(|_| out_of_range(n.to_string())),
            RawValue::Str(s) => s.trim().parse().map_err(|_| out_of_range(s.clone())),
            other => Err(DecodeError::shape(Self::EXPECTED, other)),
        }
    }
}

impl FromRaw for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_raw(raw: &RawValue) -> Result<Self, DecodeError> {
        match raw {
            RawValue::Bool(b) => Ok(*b),
            RawValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(DecodeError::Scalar {
                    expected: Self::EXPECTED,
                    value: s.clone(),
                }),
            },
            other => Err(DecodeError::shape(Self::EXPECTED, other)),
        }
    }
}

/// Run hooks in order; the first decoded value wins.
pub fn run_chain<T: FromRaw>(raw: &RawValue, chain: &[Hook<T>]) -> Result<T, DecodeError> {
    for hook in chain {
        if let Hooked::Decoded(value) = hook(raw)? {
            return Ok(value);
        }
    }
    T::from_raw(raw)
}

const ROOT: &[Hook<FilesystemRoot>] = &[root::from_str];
const PORT: &[Hook<u16>] = &[];
const FLAG: &[Hook<bool>] = &[];
const HEADERS: &[Hook<HeaderSet>] = &[headers::from_str, headers::from_map];
const COMPRESSION: &[Hook<Compression>] = &[compression::from_str, compression::from_int];
const CERTIFICATE: &[Hook<Certificate>] = &[pem::certificate_from_str];
const PRIVATE_KEY: &[Hook<PrivateKey>] = &[pem::private_key_from_str];
const VERSION: &[Hook<ProtocolVersion>] = &[tls::version_from_str];
const CURVES: &[Hook<CurveSet>] = &[tls::curves_from_csv, tls::curves_from_list];
const CIPHERS: &[Hook<CipherSuiteSet>] = &[tls::ciphers_from_csv, tls::ciphers_from_list];
const EMAIL: &[Hook<AcmeEmail>] = &[acme::email_from_str];
const URL: &[Hook<AcmeUrl>] = &[acme::url_from_str];
const DOMAINS: &[Hook<AcmeDomains>] = &[acme::domains_from_csv, acme::domains_from_list];
const CHALLENGE_PATH: &[Hook<AcmeChallengePath>] = &[acme::challenge_path_from_str];

/// Whether a missing value is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Missing leaves the empty value in place.
    Defaulted,
}

/// One configuration field: its dotted path and how to decode into it.
pub struct FieldHook {
    pub path: &'static str,
    pub presence: Presence,
    apply: fn(&RawValue, &mut Config) -> Result<(), DecodeError>,
}

macro_rules! field {
    (Optional $path:literal, |$config:ident| $target:expr, $chain:expr) => {
        FieldHook {
            path: $path,
            presence: Presence::Optional,
            apply: |raw, $config| {
                $target = Some(run_chain(raw, $chain)?);
                Ok(())
            },
        }
    };
    ($presence:ident $path:literal, |$config:ident| $target:expr, $chain:expr) => {
        FieldHook {
            path: $path,
            presence: Presence::$presence,
            apply: |raw, $config| {
                $target = run_chain(raw, $chain)?;
                Ok(())
            },
        }
    };
}

/// Every decodable field, in decode order.
pub static FIELDS: &[FieldHook] = &[
    field!(Required "root", |c| c.root, ROOT),
    field!(Required "port", |c| c.port, PORT),
    field!(Defaulted "headers", |c| c.headers, HEADERS),
    field!(Required "compression", |c| c.compression, COMPRESSION),
    field!(Optional "tls.crt", |c| c.tls.certificate, CERTIFICATE),
    field!(Optional "tls.key", |c| c.tls.key, PRIVATE_KEY),
    field!(Optional "tls.ca", |c| c.tls.ca, CERTIFICATE),
    field!(Required "tls.minVersion", |c| c.tls.min_version, VERSION),
    field!(Optional "tls.maxVersion", |c| c.tls.max_version, VERSION),
    field!(Required "tls.curves", |c| c.tls.curves, CURVES),
    field!(Required "tls.ciphers", |c| c.tls.ciphers, CIPHERS),
    field!(Required "tls.acme.enabled", |c| c.tls.acme.enabled, FLAG),
    field!(Optional "tls.acme.email", |c| c.tls.acme.email, EMAIL),
    field!(Optional "tls.acme.url", |c| c.tls.acme.url, URL),
    field!(Defaulted "tls.acme.domains", |c| c.tls.acme.domains, DOMAINS),
    field!(Optional "tls.acme.challengePath", |c| c.tls.acme.challenge_path, CHALLENGE_PATH),
    field!(Required "metrics.enabled", |c| c.metrics.enabled, FLAG),
    field!(Required "metrics.metricsPort", |c| c.metrics.metrics_port, PORT),
];

/// Dotted paths of every registered field.
pub fn field_paths() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|field| field.path)
}

/// Decode a merged tree into a typed configuration.
pub fn decode(tree: &RawValue) -> Result<Config, ConfigError> {
    let mut config = Config::skeleton();

    for field in FIELDS {
        let raw = tree
            .lookup(field.path)
            .map_err(|e| ConfigError::NotAMapping {
                path: e.at,
                found: e.found,
            })?;

        match (raw, field.presence) {
            (Some(raw), _) => {
                (field.apply)(raw, &mut config).map_err(|source| ConfigError::Field {
                    path: field.path,
                    source,
                })?
            }
            (None, Presence::Required) => return Err(ConfigError::Missing(field.path)),
            (None, _) => {}
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::raw::RawMap;

    fn minimal() -> RawMap {
        RawMap::new()
            .with("root", "/tmp")
            .with("port", RawValue::Int(8080))
            .with("compression", "speed")
            .with(
                "tls",
                RawMap::new()
                    .with("minVersion", "TLS1.2")
                    .with("curves", "P-256")
                    .with("ciphers", "TLS_AES_256_GCM_SHA384")
                    .with("acme", RawMap::new().with("enabled", false)),
            )
            .with(
                "metrics",
                RawMap::new().with("enabled", "no").with("metricsPort", "9090"),
            )
    }

    #[test]
    fn test_first_applicable_hook_wins() {
        fn decline(_: &RawValue) -> Result<Hooked<Compression>, DecodeError> {
            Ok(Hooked::NotApplicable)
        }
        fn nine(_: &RawValue) -> Result<Hooked<Compression>, DecodeError> {
            Ok(Hooked::Decoded(Compression::BEST))
        }

        let chain: &[Hook<Compression>] = &[decline, nine, compression::from_str];
        assert_eq!(run_chain(&RawValue::str("none"), chain).unwrap(), Compression::BEST);
    }

    #[test]
    fn test_all_declined_falls_back_to_shape_error() {
        let err = run_chain(&RawValue::Bool(true), COMPRESSION).unwrap_err();
        assert!(matches!(err, DecodeError::Shape { .. }));
    }

    #[test]
    fn test_structural_scalars() {
        assert_eq!(run_chain(&RawValue::Int(443), PORT).unwrap(), 443);
        assert_eq!(run_chain(&RawValue::str(" 8443 "), PORT).unwrap(), 8443);
        assert!(run_chain(&RawValue::Int(70000), PORT).is_err());
        assert!(run_chain(&RawValue::Int(-1), PORT).is_err());
        assert!(run_chain(&RawValue::Bool(true), PORT).is_err());

        assert!(run_chain(&RawValue::str("YES"), FLAG).unwrap());
        assert!(!run_chain(&RawValue::str("0"), FLAG).unwrap());
        assert!(run_chain(&RawValue::str("maybe"), FLAG).is_err());
        assert!(run_chain(&RawValue::Int(1), FLAG).is_err());
    }

    #[test]
    fn test_decode_minimal_tree() {
        let config = decode(&RawValue::Map(minimal())).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.compression, Compression::SPEED);
        assert!(config.headers.is_empty());
        assert!(config.tls.certificate.is_none());
        assert!(config.tls.acme.domains.is_empty());
        assert_eq!(config.metrics.metrics_port, 9090);
    }

    #[test]
    fn test_field_error_names_path() {
        let mut tree = minimal();
        if let Some(RawValue::Map(tls)) = tree.get_mut("tls") {
            tls.insert("minVersion", RawValue::str("TLS2.0"));
        }
        let err = decode(&RawValue::Map(tree)).unwrap_err();
        assert!(matches!(err, ConfigError::Field { path: "tls.minVersion", .. }));
        assert!(err.to_string().contains("unsupported TLS version"), "{err}");
    }

    #[test]
    fn test_missing_required_field() {
        let mut tree = minimal();
        tree.insert("port", RawValue::Null);
        let err = decode(&RawValue::Map(tree)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("port")));
    }

    #[test]
    fn test_scalar_where_record_expected() {
        let tree = minimal().with("metrics", "on");
        let err = decode(&RawValue::Map(tree)).unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping { ref path, .. } if path == "metrics"));
    }

    #[test]
    fn test_field_paths_are_unique() {
        let mut paths: Vec<_> = field_paths().map(str::to_lowercase).collect();
        let count = paths.len();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), count);
    }
}
