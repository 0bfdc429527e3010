//! ACME registration fields.
//!
//! Only the shape of each field is checked here. Issuing certificates is
//! not part of this crate.

use std::fmt;

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Serialize, Serializer};
use url::Url;

use crate::config::error::DecodeError;
use crate::config::hooks::{FromRaw, Hooked};
use crate::config::raw::RawValue;
use crate::decode::{csv_items, list_items};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

static DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*\.)?([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}$").expect("domain pattern")
});

/// Account contact address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AcmeEmail(String);

impl AcmeEmail {
    pub fn parse(input: &str) -> Result<Self, DecodeError> {
        if !EMAIL.is_match(input) {
            return Err(DecodeError::InvalidEmail(input.to_string()));
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRaw for AcmeEmail {
    const EXPECTED: &'static str = "email address string";
}

/// Hook for `(string, AcmeEmail)`.
pub fn email_from_str(raw: &RawValue) -> Result<Hooked<AcmeEmail>, DecodeError> {
    match raw {
        RawValue::Str(s) => AcmeEmail::parse(s).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

/// ACME directory URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AcmeUrl(Url);

impl AcmeUrl {
    /// Requires an absolute URI with a scheme.
    pub fn parse(input: &str) -> Result<Self, DecodeError> {
        Url::parse(input)
            .map(Self)
            .map_err(|source| DecodeError::InvalidAcmeUrl {
                value: input.to_string(),
                source,
            })
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for AcmeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for AcmeUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

impl FromRaw for AcmeUrl {
    const EXPECTED: &'static str = "absolute URL string";
}

/// Hook for `(string, AcmeUrl)`.
pub fn url_from_str(raw: &RawValue) -> Result<Hooked<AcmeUrl>, DecodeError> {
    match raw {
        RawValue::Str(s) => AcmeUrl::parse(s).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

/// Domains to request certificates for, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AcmeDomains(Vec<String>);

impl AcmeDomains {
    /// Each entry is trimmed and must be a hostname with an optional leading `*.`.
    /// Repeats are rejected.
    pub fn parse<'a>(entries: impl IntoIterator<Item = &'a str>) -> Result<Self, DecodeError> {
        let mut domains: Vec<String> = Vec::new();
        for entry in entries {
            let domain = entry.trim();
            if !DOMAIN.is_match(domain) {
                return Err(DecodeError::InvalidDomain(domain.to_string()));
            }
            if domains.iter().any(|d| d == domain) {
                return Err(DecodeError::DuplicateDomain(domain.to_string()));
            }
            domains.push(domain.to_string());
        }
        Ok(Self(domains))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromRaw for AcmeDomains {
    const EXPECTED: &'static str = "comma-separated string or list of domains";
}

/// Hook for `(string, AcmeDomains)`.
pub fn domains_from_csv(raw: &RawValue) -> Result<Hooked<AcmeDomains>, DecodeError> {
    match raw {
        RawValue::Str(s) => AcmeDomains::parse(csv_items(s)).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

/// Hook for `(list, AcmeDomains)`.
pub fn domains_from_list(raw: &RawValue) -> Result<Hooked<AcmeDomains>, DecodeError> {
    match raw {
        RawValue::List(items) => AcmeDomains::parse(list_items(items)?).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

/// URL path the HTTP-01 challenge responder is mounted on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AcmeChallengePath(String);

impl AcmeChallengePath {
    /// The path must start with `/`, and URL parsing then percent-decoding it
    /// must give back the same text. Percent escapes are never literal.
    pub fn parse(input: &str) -> Result<Self, DecodeError> {
        let invalid = |reason| DecodeError::InvalidChallengePath {
            value: input.to_string(),
            reason,
        };

        if !input.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        if input.contains('%') {
            return Err(invalid("contains a percent escape"));
        }

        let base = Url::parse("http://localhost/").map_err(|_| invalid("unparsable"))?;
        let parsed = base.join(input).map_err(|_| invalid("unparsable"))?;
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("not a literal path"));
        }
        let decoded = percent_decode_str(parsed.path())
            .decode_utf8()
            .map_err(|_| invalid("unparsable"))?;
        if decoded != input {
            return Err(invalid("not a literal path"));
        }

        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRaw for AcmeChallengePath {
    const EXPECTED: &'static str = "absolute path string";
}

/// Hook for `(string, AcmeChallengePath)`.
pub fn challenge_path_from_str(raw: &RawValue) -> Result<Hooked<AcmeChallengePath>, DecodeError> {
    match raw {
        RawValue::Str(s) => AcmeChallengePath::parse(s).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}
