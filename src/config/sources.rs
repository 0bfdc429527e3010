//! Configuration sources and how they are layered.
//!
//! # Responsibilities
//! - Provide the built-in defaults as a raw tree
//! - Select the environment overrides under the configured prefix
//! - Layer defaults, the optional YAML file and the overrides with the
//!   `config` crate, then hand back one owned [`RawValue`] tree
//!
//! # Design Decisions
//! - The layering library is used for one build and then dropped; nothing
//!   retains a handle to it after assembly
//! - Environment names are derived from the registered field paths, so only
//!   variables that map to a real field are ever read
//! - Lists and scalars replace the lower layer wholesale; mappings merge per key
//! - A `null` from the file leaves the default in place

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ::config::{FileFormat, Map, Value, ValueKind};

use crate::config::loader::ConfigError;
use crate::config::raw::{RawMap, RawValue};

/// Variable holding the prefix for every other variable.
pub const ENV_PREFIX_VAR: &str = "GSS_ENV_PREFIX";

/// Variable holding the YAML file path, after the prefix.
pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";

/// Separator between the prefix and the path segments of a variable name.
const ENV_SEPARATOR: &str = "_";

const DEFAULT_CURVES: [&str; 3] = ["P-256", "P-384", "P-521"];

const DEFAULT_CIPHERS: [&str; 9] = [
    "TLS_AES_256_GCM_SHA384",
    "TLS_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_RSA_WITH_AES_256_GCM_SHA384",
];

/// A snapshot of environment variables.
///
/// Assembly reads variables through this type only, so callers can supply
/// a fixed set instead of the process environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Variables of the current process. Names or values that are not UTF-8 are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    /// The value of `name`. Empty values count as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// The trimmed, upper-cased prefix. Empty when unset.
pub fn env_prefix(env: &Environment) -> String {
    env.get(ENV_PREFIX_VAR)
        .map(|prefix| prefix.trim().to_uppercase())
        .unwrap_or_default()
}

/// Variable name for a dotted field path, e.g. `tls.minVersion` → `PREFIX_TLS_MINVERSION`.
pub fn env_var_name(prefix: &str, path: &str) -> String {
    let name = path.replace('.', "_").to_uppercase();
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}_{name}")
    }
}

/// Location of the YAML file, if one is configured. Relative paths resolve against `cwd`.
pub fn config_path(env: &Environment, prefix: &str, cwd: &Path) -> Option<PathBuf> {
    let name = if prefix.is_empty() {
        CONFIG_PATH_VAR.to_string()
    } else {
        format!("{prefix}_{CONFIG_PATH_VAR}")
    };
    env.get(&name).map(|path| cwd.join(path))
}

/// Built-in values for every required field.
pub fn defaults(cwd: &Path) -> RawValue {
    RawValue::Map(
        RawMap::new()
            .with("root", RawValue::str(cwd.to_string_lossy()))
            .with("port", RawValue::Int(8080))
            .with("headers", RawMap::new())
            .with("compression", "speed")
            .with(
                "tls",
                RawMap::new()
                    .with("minVersion", "TLS1.2")
                    .with("curves", DEFAULT_CURVES.to_vec())
                    .with("ciphers", DEFAULT_CIPHERS.to_vec())
                    .with("acme", RawMap::new().with("enabled", false)),
            )
            .with(
                "metrics",
                RawMap::new()
                    .with("enabled", false)
                    .with("metricsPort", RawValue::Int(9090)),
            ),
    )
}

/// Environment overrides for the given field paths, keyed by variable name.
///
/// Every override is a string; the field's hooks decide how to read it.
pub fn env_overrides<'a>(
    env: &Environment,
    prefix: &str,
    paths: impl IntoIterator<Item = &'a str>,
) -> Map<String, String> {
    paths
        .into_iter()
        .filter_map(|path| {
            let name = env_var_name(prefix, path);
            let value = env.get(&name)?.to_string();
            Some((name, value))
        })
        .collect()
}

/// Layer `defaults`, the YAML file at `file` and `overrides`, in rising precedence.
pub fn layer(
    defaults: &RawValue,
    file: Option<&Path>,
    prefix: &str,
    overrides: Map<String, String>,
) -> Result<RawValue, ConfigError> {
    let mut builder = ::config::Config::builder();

    if let RawValue::Map(map) = defaults {
        for (key, value) in map.iter() {
            builder = builder.set_default(key.to_lowercase(), to_value(value))?;
        }
    }

    if let Some(path) = file {
        fs::File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        builder = builder.add_source(
            ::config::File::from(path)
                .format(FileFormat::Yaml)
                .required(true),
        );
    }

    let environment = if prefix.is_empty() {
        ::config::Environment::default()
    } else {
        ::config::Environment::with_prefix(prefix)
    };
    builder = builder.add_source(environment.separator(ENV_SEPARATOR).source(Some(overrides)));

    let merged: Value = builder.build()?.try_deserialize()?;
    Ok(into_raw(merged, Some(defaults)))
}

/// Anchor a relative `root` on `cwd`.
pub fn anchor_root(tree: &mut RawValue, cwd: &Path) {
    let RawValue::Map(map) = tree else {
        return;
    };
    if let Some(RawValue::Str(root)) = map.get_mut("root") {
        if !root.is_empty() && Path::new(root.as_str()).is_relative() {
            *root = cwd.join(root.as_str()).to_string_lossy().into_owned();
        }
    }
}

fn to_value(raw: &RawValue) -> Value {
    let kind = match raw {
        RawValue::Null => ValueKind::Nil,
        RawValue::Bool(b) => ValueKind::Boolean(*b),
        RawValue::Int(n) => i64::try_from(*n)
            .map(ValueKind::I64)
            .unwrap_or_else(|_| ValueKind::String(n.to_string())),
        RawValue::Float(f) => ValueKind::Float(*f),
        RawValue::Str(s) => ValueKind::String(s.clone()),
        RawValue::List(items) => ValueKind::Array(items.iter().map(to_value).collect()),
        RawValue::Map(map) => ValueKind::Table(
            map.iter()
                .map(|(key, value)| (key.to_lowercase(), to_value(value)))
                .collect(),
        ),
    };
    Value::new(None, kind)
}

/// Convert the layered value back into a raw tree. A null takes `fallback`.
fn into_raw(value: Value, fallback: Option<&RawValue>) -> RawValue {
    match value.kind {
        ValueKind::Nil => fallback.cloned().unwrap_or(RawValue::Null),
        ValueKind::Boolean(b) => RawValue::Bool(b),
        ValueKind::I64(n) => RawValue::Int(n.into()),
        ValueKind::I128(n) => RawValue::Int(n),
        ValueKind::U64(n) => RawValue::Int(n.into()),
        ValueKind::U128(n) => i128::try_from(n)
            .map(RawValue::Int)
            .unwrap_or_else(|_| RawValue::str(n.to_string())),
        ValueKind::Float(f) => RawValue::Float(f),
        ValueKind::String(s) => RawValue::Str(s),
        ValueKind::Array(items) => {
            RawValue::List(items.into_iter().map(|item| into_raw(item, None)).collect())
        }
        ValueKind::Table(table) => {
            let defaults = fallback.and_then(RawValue::as_map);
            RawValue::Map(
                table
                    .into_iter()
                    .map(|(key, value)| {
                        let fallback = defaults.and_then(|map| map.get(&key));
                        (key, into_raw(value, fallback))
                    })
                    .collect::<RawMap>(),
            )
        }
    }
}
