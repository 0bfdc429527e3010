//! Certificate and private key material.
//!
//! # Responsibilities
//! - Accept either inline PEM text or a path to a PEM file
//! - Parse the first PEM block into an X.509 certificate or a private key
//! - Keep the DER block so the server can hand it to its TLS stack unchanged
//!
//! # Design Decisions
//! - Inline PEM is tried first; text with no PEM block is treated as a path
//! - Errors name the stage that failed (`inline PEM` or `file <path>`)
//! - Supported keys: PKCS#1 RSA, SEC1 EC, and PKCS#8 wrapping RSA, EC or Ed25519.
//!   Any other PKCS#8 algorithm is an error
//! - Reading the file is the only side effect

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use pkcs8::ObjectIdentifier;
use rustls_pemfile::Item;
use serde::Serialize;
use tracing::debug;
use x509_parser::certificate::X509Certificate;

use crate::config::error::{DecodeError, PemStage};
use crate::config::hooks::{FromRaw, Hooked};
use crate::config::raw::RawValue;

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

const EC_CURVES: [(ObjectIdentifier, &str); 3] = [
    (ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7"), "P-256"),
    (ObjectIdentifier::new_unwrap("1.3.132.0.34"), "P-384"),
    (ObjectIdentifier::new_unwrap("1.3.132.0.35"), "P-521"),
];

/// One DER object and the label of the PEM block it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct PemBlock {
    label: &'static str,
    der: Vec<u8>,
}

impl PemBlock {
    fn new(label: &'static str, der: &[u8]) -> Self {
        Self {
            label,
            der: der.to_vec(),
        }
    }

    pub fn label(&self) -> &str {
        self.label
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

// Key material never reaches logs.
impl fmt::Debug for PemBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PemBlock")
            .field("label", &self.label)
            .field("len", &self.der.len())
            .finish()
    }
}

/// Outcome of looking for PEM data inline and then on disk.
enum PemSource {
    Found { stage: PemStage, item: Item },
    Empty { stage: PemStage },
    Malformed { stage: PemStage, reason: String },
}

fn read_pem(input: &str, kind: &'static str) -> Result<PemSource, (PathBuf, io::Error)> {
    match rustls_pemfile::read_one(&mut input.as_bytes()) {
        Ok(Some(item)) => {
            return Ok(PemSource::Found {
                stage: PemStage::Inline,
                item,
            })
        }
        Err(e) => {
            return Ok(PemSource::Malformed {
                stage: PemStage::Inline,
                reason: e.to_string(),
            })
        }
        Ok(None) => {}
    }

    let path = PathBuf::from(input);
    debug!(kind, path = %path.display(), "no inline PEM, reading file");
    let bytes = fs::read(&path).map_err(|e| (path.clone(), e))?;
    let stage = PemStage::File(path);

    Ok(match rustls_pemfile::read_one(&mut bytes.as_slice()) {
        Ok(Some(item)) => PemSource::Found { stage, item },
        Ok(None) => PemSource::Empty { stage },
        Err(e) => PemSource::Malformed {
            stage,
            reason: e.to_string(),
        },
    })
}

fn label(item: &Item) -> &'static str {
    match item {
        Item::X509Certificate(_) => "CERTIFICATE",
        Item::Pkcs1Key(_) => "RSA PRIVATE KEY",
        Item::Sec1Key(_) => "EC PRIVATE KEY",
        Item::Pkcs8Key(_) => "PRIVATE KEY",
        Item::Crl(_) => "X509 CRL",
        Item::Csr(_) => "CERTIFICATE REQUEST",
        _ => "unknown",
    }
}

/// A parsed X.509 certificate and the DER it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    #[serde(skip)]
    block: PemBlock,
    #[serde(skip)]
    stage: PemStage,
    subject: String,
    issuer: String,
    serial: String,
    not_before: String,
    not_after: String,
    is_ca: bool,
}

impl Certificate {
    /// Decode inline PEM, or the PEM file `input` names.
    pub fn load(input: &str) -> Result<Self, DecodeError> {
        let source = read_pem(input, "certificate")
            .map_err(|(path, source)| DecodeError::CertificateUnreadable { path, source })?;

        let invalid = |stage, reason| DecodeError::InvalidCertificate { stage, reason };
        match source {
            PemSource::Found {
                stage,
                item: Item::X509Certificate(der),
            } => Self::from_der(&der, stage.clone()).map_err(|reason| invalid(stage, reason)),
            PemSource::Found { stage, item } => Err(invalid(
                stage,
                format!("{} block is not a certificate", label(&item)),
            )),
            PemSource::Empty { stage } => Err(invalid(stage, "no PEM block found".to_string())),
            PemSource::Malformed { stage, reason } => Err(invalid(stage, reason)),
        }
    }

    fn from_der(der: &[u8], stage: PemStage) -> Result<Self, String> {
        let (_, cert) = x509_parser::parse_x509_certificate(der).map_err(|e| e.to_string())?;
        let validity = cert.validity();

        Ok(Self {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial: cert.raw_serial_as_string(),
            not_before: validity.not_before.to_string(),
            not_after: validity.not_after.to_string(),
            is_ca: cert.is_ca(),
            block: PemBlock::new("CERTIFICATE", der),
            stage,
        })
    }

    pub fn block(&self) -> &PemBlock {
        &self.block
    }

    pub fn der(&self) -> &[u8] {
        self.block.der()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn not_after(&self) -> &str {
        &self.not_after
    }

    pub fn is_ca(&self) -> bool {
        self.is_ca
    }

    /// Where the certificate was read from.
    pub fn stage(&self) -> &PemStage {
        &self.stage
    }

    /// The full X.509 structure, re-parsed from the kept DER.
    pub fn parsed(&self) -> Result<X509Certificate<'_>, DecodeError> {
        x509_parser::parse_x509_certificate(self.der())
            .map(|(_, cert)| cert)
            .map_err(|e| DecodeError::InvalidCertificate {
                stage: self.stage.clone(),
                reason: e.to_string(),
            })
    }
}

impl FromRaw for Certificate {
    const EXPECTED: &'static str = "PEM text or certificate file path";
}

/// Hook for `(string, Certificate)`.
pub fn certificate_from_str(raw: &RawValue) -> Result<Hooked<Certificate>, DecodeError> {
    match raw {
        RawValue::Str(s) => Certificate::load(s).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

/// Container format of a private key, given by its PEM label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    Pkcs1,
    Sec1,
    Pkcs8,
}

/// Key algorithm and its main parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KeyAlgorithm {
    Rsa {
        #[serde(rename = "modulusBits")]
        modulus_bits: usize,
    },
    Ec {
        curve: Option<String>,
    },
    Ed25519,
}

/// A parsed private key and the DER it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivateKey {
    #[serde(skip)]
    block: PemBlock,
    encoding: KeyEncoding,
    algorithm: KeyAlgorithm,
}

impl PrivateKey {
    /// Decode inline PEM, or the PEM file `input` names.
    pub fn load(input: &str) -> Result<Self, DecodeError> {
        let source = read_pem(input, "private key")
            .map_err(|(path, source)| DecodeError::PrivateKeyUnreadable { path, source })?;

        let invalid = |stage, reason| DecodeError::InvalidPrivateKey { stage, reason };
        match source {
            PemSource::Found { stage, item } => {
                Self::from_item(&item).map_err(|reason| invalid(stage, reason))
            }
            PemSource::Empty { stage } => Err(invalid(stage, "no PEM block found".to_string())),
            PemSource::Malformed { stage, reason } => Err(invalid(stage, reason)),
        }
    }

    fn from_item(item: &Item) -> Result<Self, String> {
        let (encoding, der, algorithm) = match item {
            Item::Pkcs1Key(key) => {
                let der = key.secret_pkcs1_der();
                (KeyEncoding::Pkcs1, der, rsa_algorithm(der)?)
            }
            Item::Sec1Key(key) => {
                let der = key.secret_sec1_der();
                (KeyEncoding::Sec1, der, ec_algorithm(der, None)?)
            }
            Item::Pkcs8Key(key) => {
                let der = key.secret_pkcs8_der();
                (KeyEncoding::Pkcs8, der, pkcs8_algorithm(der)?)
            }
            other => return Err(format!("unsupported private key type {:?}", label(other))),
        };

        Ok(Self {
            block: PemBlock::new(label(item), der),
            encoding,
            algorithm,
        })
    }

    pub fn block(&self) -> &PemBlock {
        &self.block
    }

    pub fn der(&self) -> &[u8] {
        self.block.der()
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    pub fn algorithm(&self) -> &KeyAlgorithm {
        &self.algorithm
    }
}

fn rsa_algorithm(der: &[u8]) -> Result<KeyAlgorithm, String> {
    let key =
        pkcs1::RsaPrivateKey::try_from(der).map_err(|e| format!("invalid PKCS#1 RSA key: {e}"))?;
    Ok(KeyAlgorithm::Rsa {
        modulus_bits: bit_len(key.modulus.as_bytes()),
    })
}

fn ec_algorithm(der: &[u8], curve: Option<ObjectIdentifier>) -> Result<KeyAlgorithm, String> {
    let key = sec1::EcPrivateKey::try_from(der).map_err(|e| format!("invalid SEC1 EC key: {e}"))?;
    let curve = curve.or_else(|| key.parameters.and_then(|p| p.named_curve()));
    Ok(KeyAlgorithm::Ec {
        curve: curve.map(curve_name),
    })
}

fn pkcs8_algorithm(der: &[u8]) -> Result<KeyAlgorithm, String> {
    let info =
        pkcs8::PrivateKeyInfo::try_from(der).map_err(|e| format!("invalid PKCS#8 key: {e}"))?;
    let oid = info.algorithm.oid;

    if oid == RSA_ENCRYPTION {
        rsa_algorithm(info.private_key)
    } else if oid == EC_PUBLIC_KEY {
        ec_algorithm(info.private_key, info.algorithm.parameters_oid().ok())
    } else if oid == ED25519 {
        // CurvePrivateKey ::= OCTET STRING (SIZE (32))
        match info.private_key {
            [0x04, 0x20, seed @ ..] if seed.len() == 32 => Ok(KeyAlgorithm::Ed25519),
            _ => Err("invalid Ed25519 key: expected a 32-byte seed".to_string()),
        }
    } else {
        Err(format!("unsupported private key algorithm {oid} in PKCS#8 format"))
    }
}

fn curve_name(oid: ObjectIdentifier) -> String {
    EC_CURVES
        .iter()
        .find(|(known, _)| *known == oid)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| oid.to_string())
}

fn bit_len(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(first) => bytes.len() * 8 - first.leading_zeros() as usize,
        None => 0,
    }
}

impl FromRaw for PrivateKey {
    const EXPECTED: &'static str = "PEM text or private key file path";
}

/// Hook for `(string, PrivateKey)`.
pub fn private_key_from_str(raw: &RawValue) -> Result<Hooked<PrivateKey>, DecodeError> {
    match raw {
        RawValue::Str(s) => PrivateKey::load(s).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}
