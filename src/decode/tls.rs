//! TLS protocol parameters: versions, key-exchange curves and cipher suites.
//!
//! # Responsibilities
//! - Map configuration names onto protocol constants
//! - Accept curve and cipher lists as a comma-separated string or a list
//! - Reject unknown names and repeated entries
//!
//! # Design Decisions
//! - Version and curve names match case-insensitively, cipher names exactly
//! - Order is preserved: it is the server's preference order
//! - Repeats are an error, not silently dropped

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::config::error::DecodeError;
use crate::config::hooks::{FromRaw, Hooked};
use crate::config::raw::RawValue;
use crate::decode::{csv_items, list_items};

/// A TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 4] = [
        ProtocolVersion::Tls10,
        ProtocolVersion::Tls11,
        ProtocolVersion::Tls12,
        ProtocolVersion::Tls13,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProtocolVersion::Tls10 => "TLS1.0",
            ProtocolVersion::Tls11 => "TLS1.1",
            ProtocolVersion::Tls12 => "TLS1.2",
            ProtocolVersion::Tls13 => "TLS1.3",
        }
    }

    /// The `ProtocolVersion` value carried on the wire.
    pub fn wire(self) -> u16 {
        match self {
            ProtocolVersion::Tls10 => 0x0301,
            ProtocolVersion::Tls11 => 0x0302,
            ProtocolVersion::Tls12 => 0x0303,
            ProtocolVersion::Tls13 => 0x0304,
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = DecodeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let upper = input.to_uppercase();
        Self::ALL
            .into_iter()
            .find(|v| v.name() == upper)
            .ok_or(DecodeError::UnsupportedTlsVersion(upper))
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl FromRaw for ProtocolVersion {
    const EXPECTED: &'static str = "TLS version string";
}

/// Hook for `(string, ProtocolVersion)`.
pub fn version_from_str(raw: &RawValue) -> Result<Hooked<ProtocolVersion>, DecodeError> {
    match raw {
        RawValue::Str(s) => s.parse().map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

/// A named group for ECDHE key exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedCurve {
    P256,
    P384,
    P521,
    X25519,
}

/// Accepted names, upper-case. `ED25519` is kept as an alias of X25519.
const CURVE_NAMES: [(&str, NamedCurve); 5] = [
    ("P-256", NamedCurve::P256),
    ("P-384", NamedCurve::P384),
    ("P-521", NamedCurve::P521),
    ("X25519", NamedCurve::X25519),
    ("ED25519", NamedCurve::X25519),
];

impl NamedCurve {
    pub fn name(self) -> &'static str {
        match self {
            NamedCurve::P256 => "P-256",
            NamedCurve::P384 => "P-384",
            NamedCurve::P521 => "P-521",
            NamedCurve::X25519 => "X25519",
        }
    }

    /// IANA TLS supported-groups registry id.
    pub fn iana_id(self) -> u16 {
        match self {
            NamedCurve::P256 => 23,
            NamedCurve::P384 => 24,
            NamedCurve::P521 => 25,
            NamedCurve::X25519 => 29,
        }
    }
}

impl FromStr for NamedCurve {
    type Err = DecodeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let upper = input.trim().to_uppercase();
        CURVE_NAMES
            .iter()
            .find(|(name, _)| *name == upper)
            .map(|(_, curve)| *curve)
            .ok_or(DecodeError::UnsupportedCurve(upper))
    }
}

impl fmt::Display for NamedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for NamedCurve {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Ordered, duplicate-free curve preference list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CurveSet(Vec<NamedCurve>);

impl CurveSet {
    pub fn parse<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, DecodeError> {
        let mut curves = Vec::new();
        for name in names {
            let curve: NamedCurve = name.parse()?;
            if curves.contains(&curve) {
                return Err(DecodeError::DuplicateCurve(name.trim().to_uppercase()));
            }
            curves.push(curve);
        }
        Ok(Self(curves))
    }

    pub fn as_slice(&self) -> &[NamedCurve] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = NamedCurve> + '_ {
        self.0.iter().copied()
    }
}

impl FromStr for CurveSet {
    type Err = DecodeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(csv_items(input))
    }
}

impl FromRaw for CurveSet {
    const EXPECTED: &'static str = "comma-separated string or list of curve names";
}

/// Hook for `(string, CurveSet)`.
pub fn curves_from_csv(raw: &RawValue) -> Result<Hooked<CurveSet>, DecodeError> {
    match raw {
        RawValue::Str(s) => s.parse().map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

/// Hook for `(list, CurveSet)`.
pub fn curves_from_list(raw: &RawValue) -> Result<Hooked<CurveSet>, DecodeError> {
    match raw {
        RawValue::List(items) => CurveSet::parse(list_items(items)?).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

macro_rules! cipher_suites {
    ($($suite:ident = $id:literal,)*) => {
        /// A cipher suite this server can be configured with.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CipherSuite {
            $($suite,)*
        }

        impl CipherSuite {
            pub const ALL: &'static [CipherSuite] = &[$(CipherSuite::$suite,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(CipherSuite::$suite => stringify!($suite),)*
                }
            }

            /// IANA TLS cipher suite registry id.
            pub fn iana_id(self) -> u16 {
                match self {
                    $(CipherSuite::$suite => $id,)*
                }
            }
        }
    };
}

cipher_suites! {
    TLS_AES_128_GCM_SHA256 = 0x1301,
    TLS_AES_256_GCM_SHA384 = 0x1302,
    TLS_CHACHA20_POLY1305_SHA256 = 0x1303,
    TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA = 0xc009,
    TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256 = 0xc023,
    TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 = 0xc02b,
    TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA = 0xc00a,
    TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 = 0xc02c,
    TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256 = 0xcca9,
    TLS_ECDHE_ECDSA_WITH_RC4_128_SHA = 0xc007,
    TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA = 0xc012,
    TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA = 0xc013,
    TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256 = 0xc027,
    TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 = 0xc02f,
    TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA = 0xc014,
    TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 = 0xc030,
    TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256 = 0xcca8,
    TLS_ECDHE_RSA_WITH_RC4_128_SHA = 0xc011,
    TLS_RSA_WITH_AES_128_CBC_SHA256 = 0x003c,
    TLS_RSA_WITH_AES_128_GCM_SHA256 = 0x009c,
    TLS_RSA_WITH_AES_256_GCM_SHA384 = 0x009d,
}

impl FromStr for CipherSuite {
    type Err = DecodeError;

    /// Exact, case-sensitive match. Surrounding whitespace is not trimmed.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|suite| suite.name() == input)
            .ok_or_else(|| DecodeError::UnsupportedCipher(input.to_string()))
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for CipherSuite {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Ordered, duplicate-free cipher suite preference list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CipherSuiteSet(Vec<CipherSuite>);

impl CipherSuiteSet {
    pub fn parse<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, DecodeError> {
        let mut suites = Vec::new();
        for name in names {
            let suite: CipherSuite = name.parse()?;
            if suites.contains(&suite) {
                return Err(DecodeError::DuplicateCipher(name.to_string()));
            }
            suites.push(suite);
        }
        Ok(Self(suites))
    }

    pub fn as_slice(&self) -> &[CipherSuite] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = CipherSuite> + '_ {
        self.0.iter().copied()
    }
}

impl FromStr for CipherSuiteSet {
    type Err = DecodeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(csv_items(input))
    }
}

impl FromRaw for CipherSuiteSet {
    const EXPECTED: &'static str = "comma-separated string or list of cipher suite names";
}

/// Hook for `(string, CipherSuiteSet)`.
pub fn ciphers_from_csv(raw: &RawValue) -> Result<Hooked<CipherSuiteSet>, DecodeError> {
    match raw {
        RawValue::Str(s) => s.parse().map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

/// Hook for `(list, CipherSuiteSet)`.
pub fn ciphers_from_list(raw: &RawValue) -> Result<Hooked<CipherSuiteSet>, DecodeError> {
    match raw {
        RawValue::List(items) => CipherSuiteSet::parse(list_items(items)?).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}
