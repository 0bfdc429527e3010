//! End-to-end assembly: defaults, YAML file and environment together.

use std::fs;

use gss_config::config::error::DecodeError;
use gss_config::decode::compression::Compression;
use gss_config::decode::pem::KeyAlgorithm;
use gss_config::decode::tls::{CipherSuite, NamedCurve, ProtocolVersion};
use gss_config::{build_from, ConfigError};

mod common;
use common::{env, Workspace, CERT, EC_KEY};

#[test]
fn test_defaults_when_nothing_is_set() {
    let ws = Workspace::new();
    let config = build_from(&env(&[]), ws.path()).unwrap();

    assert_eq!(config.root.as_path(), fs::canonicalize(ws.path()).unwrap());
    assert_eq!(config.port, 8080);
    assert_eq!(config.compression, Compression::SPEED);
    assert!(config.headers.is_empty());
    assert_eq!(config.tls.min_version, ProtocolVersion::Tls12);
    assert_eq!(config.tls.max_version, None);
    assert_eq!(
        config.tls.curves.as_slice(),
        &[NamedCurve::P256, NamedCurve::P384, NamedCurve::P521]
    );
    assert_eq!(config.tls.ciphers.as_slice().len(), 9);
    assert_eq!(
        config.tls.ciphers.as_slice()[0],
        CipherSuite::TLS_AES_256_GCM_SHA384
    );
    assert!(!config.tls.acme.enabled);
    assert!(!config.metrics.enabled);
    assert_eq!(config.metrics.metrics_port, 9090);
}

#[test]
fn test_environment_beats_file() {
    let ws = Workspace::new();
    ws.write("config.yaml", "tls:\n  minVersion: TLS1.3\n");

    let config = build_from(
        &env(&[
            ("GSS_ENV_PREFIX", "prefix"),
            ("PREFIX_CONFIG_PATH", "config.yaml"),
            ("PREFIX_TLS_MINVERSION", "TLS1.1"),
        ]),
        ws.path(),
    )
    .unwrap();

    assert_eq!(config.tls.min_version, ProtocolVersion::Tls11);
}

#[test]
fn test_file_beats_defaults_per_leaf() {
    let ws = Workspace::new();
    ws.write("config.yaml", "port: 9000\ntls:\n  maxversion: tls1.3\n");

    let config = build_from(&env(&[("CONFIG_PATH", "config.yaml")]), ws.path()).unwrap();

    assert_eq!(config.port, 9000);
    assert_eq!(config.tls.max_version, Some(ProtocolVersion::Tls13));
    assert_eq!(config.tls.min_version, ProtocolVersion::Tls12);
    assert_eq!(config.tls.curves.as_slice().len(), 3);
}

#[test]
fn test_unprefixed_variables_ignored_under_a_prefix() {
    let ws = Workspace::new();
    let config = build_from(
        &env(&[("GSS_ENV_PREFIX", "APP"), ("PORT", "1"), ("APP_PORT", "8443")]),
        ws.path(),
    )
    .unwrap();
    assert_eq!(config.port, 8443);
}

#[test]
fn test_full_file() {
    let ws = Workspace::new();
    let served = ws.path().join("public");
    fs::create_dir(&served).unwrap();
    let crt = ws.write("server.crt", CERT);
    let key = ws.write("server.key", EC_KEY);

    let yaml = format!(
        r#"
root: {root}
port: 8443
headers:
  X-Frame-Options: DENY
  Vary: [Accept-Encoding, Origin]
compression: best
tls:
  crt: {crt}
  key: {key}
  minVersion: TLS1.2
  maxVersion: TLS1.3
  curves: [X25519, p-256]
  ciphers: TLS_AES_256_GCM_SHA384,TLS_CHACHA20_POLY1305_SHA256
  acme:
    enabled: false
metrics:
  enabled: true
  metricsPort: 9100
"#,
        root = served.display(),
        crt = crt.display(),
        key = key.display(),
    );
    ws.write("config.yaml", &yaml);

    let config = build_from(&env(&[("CONFIG_PATH", "config.yaml")]), ws.path()).unwrap();

    assert_eq!(config.root.as_path(), fs::canonicalize(&served).unwrap());
    assert_eq!(config.port, 8443);
    assert_eq!(config.compression, Compression::BEST);
    assert_eq!(config.headers.get_all("vary").len(), 2);
    assert_eq!(
        config.tls.curves.as_slice(),
        &[NamedCurve::X25519, NamedCurve::P256]
    );
    assert_eq!(config.tls.ciphers.as_slice().len(), 2);
    assert!(config.tls.is_enabled());

    let key = config.tls.key.as_ref().unwrap();
    assert_eq!(
        key.algorithm(),
        &KeyAlgorithm::Ec {
            curve: Some("P-384".to_string())
        }
    );
    let certificate = config.tls.certificate.as_ref().unwrap();
    assert!(certificate.subject().contains("localhost"));
    assert!(config.metrics.enabled);
    assert_eq!(config.metrics.metrics_port, 9100);
}

#[test]
fn test_inline_pem_and_headers_from_environment() {
    let ws = Workspace::new();
    let config = build_from(
        &env(&[
            ("TLS_CRT", CERT),
            ("TLS_KEY", EC_KEY),
            ("HEADERS", r#"{"Cache-Control": "no-store"}"#),
            ("TLS_CURVES", "P-384,X25519"),
            ("METRICS_ENABLED", "yes"),
            ("METRICS_METRICSPORT", "9191"),
        ]),
        ws.path(),
    )
    .unwrap();

    assert!(config.tls.certificate.is_some());
    assert_eq!(config.headers.get_all("cache-control").len(), 1);
    assert_eq!(
        config.tls.curves.as_slice(),
        &[NamedCurve::P384, NamedCurve::X25519]
    );
    assert_eq!(config.metrics.metrics_port, 9191);
}

#[test]
fn test_environment_list_replaces_file_list() {
    let ws = Workspace::new();
    ws.write("config.yaml", "tls:\n  curves: [P-256, P-384]\n");

    let config = build_from(
        &env(&[("CONFIG_PATH", "config.yaml"), ("TLS_CURVES", "P-256")]),
        ws.path(),
    )
    .unwrap();
    assert_eq!(config.tls.curves.as_slice(), &[NamedCurve::P256]);
}

#[test]
fn test_file_null_keeps_default() {
    let ws = Workspace::new();
    ws.write("config.yaml", "port: ~\ncompression: best\n");

    let config = build_from(&env(&[("CONFIG_PATH", "config.yaml")]), ws.path()).unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.compression, Compression::BEST);
}

#[test]
fn test_relative_root_resolves_against_given_cwd() {
    let ws = Workspace::new();
    fs::create_dir(ws.path().join("public")).unwrap();
    ws.write("config.yaml", "root: public\n");

    let config = build_from(&env(&[("CONFIG_PATH", "config.yaml")]), ws.path()).unwrap();
    assert_eq!(
        config.root.as_path(),
        fs::canonicalize(ws.path().join("public")).unwrap()
    );
}

#[test]
fn test_broken_yaml_fails() {
    let ws = Workspace::new();
    ws.write("config.yaml", "headers:\n  key:\n\t\tsub: key\n");

    let err = build_from(&env(&[("CONFIG_PATH", "config.yaml")]), ws.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Sources(_)), "{err}");
}

#[test]
fn test_certificate_path_pointing_at_a_key() {
    let ws = Workspace::new();
    let key = ws.write("server.key", EC_KEY);

    let err = build_from(
        &env(&[("TLS_CRT", key.to_str().unwrap()), ("TLS_KEY", EC_KEY)]),
        ws.path(),
    )
    .unwrap_err();

    match err {
        ConfigError::Field { path, source } => {
            assert_eq!(path, "tls.crt");
            assert!(matches!(source, DecodeError::InvalidCertificate { .. }));
            assert!(source.to_string().contains("invalid certificate content"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_root_dot_segments() {
    let ws = Workspace::new();
    let config = build_from(&env(&[("ROOT", "/tmp/../tmp")]), ws.path()).unwrap();
    assert_eq!(config.root.as_path(), fs::canonicalize("/tmp").unwrap());

    let err = build_from(&env(&[("ROOT", "/does/not/exist")]), ws.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Field { path: "root", .. }));
}

#[test]
fn test_field_errors_name_the_field() {
    let ws = Workspace::new();
    let cases = [
        (
            "COMPRESSION",
            "100",
            "compression",
            "unsupported compression level",
        ),
        (
            "TLS_CURVES",
            "P-256,p-256",
            "tls.curves",
            "duplicate TLS curves",
        ),
        (
            "TLS_CIPHERS",
            "tls_aes_256_gcm_sha384",
            "tls.ciphers",
            "unsupported TLS cipher suite",
        ),
        (
            "HEADERS",
            "{\"Invalid !\": x}",
            "headers",
            "invalid header key",
        ),
        (
            "TLS_ACME_DOMAINS",
            "example.com,example.com",
            "tls.acme.domains",
            "duplicate domain name",
        ),
        (
            "TLS_ACME_CHALLENGEPATH",
            "test",
            "tls.acme.challengePath",
            "invalid ACME challenge path",
        ),
        ("PORT", "http", "port", "invalid port number"),
    ];
    for (var, value, path, message) in cases {
        let err = build_from(&env(&[(var, value)]), ws.path()).unwrap_err();
        assert!(
            matches!(err, ConfigError::Field { path: p, .. } if p == path),
            "{var}: {err}"
        );
        assert!(err.to_string().contains(message), "{var}: {err}");
    }
}

#[test]
fn test_cross_field_validation() {
    let ws = Workspace::new();
    let err = build_from(
        &env(&[
            ("TLS_ACME_ENABLED", "true"),
            ("METRICS_ENABLED", "true"),
            ("METRICS_METRICSPORT", "8080"),
        ]),
        ws.path(),
    )
    .unwrap_err();

    let ConfigError::Validation(errors) = err else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.len(), 3);
}

#[test]
fn test_acme_configuration() {
    let ws = Workspace::new();
    let config = build_from(
        &env(&[
            ("TLS_ACME_ENABLED", "1"),
            ("TLS_ACME_EMAIL", "ops@example.com"),
            (
                "TLS_ACME_URL",
                "https://acme-staging-v02.api.letsencrypt.org/directory",
            ),
            ("TLS_ACME_DOMAINS", "example.com, *.example.com"),
            ("TLS_ACME_CHALLENGEPATH", "/.well-known/acme-challenge/"),
        ]),
        ws.path(),
    )
    .unwrap();

    let acme = &config.tls.acme;
    assert!(acme.enabled);
    assert_eq!(acme.email.as_ref().unwrap().as_str(), "ops@example.com");
    assert_eq!(
        acme.domains.iter().collect::<Vec<_>>(),
        vec!["example.com", "*.example.com"]
    );
    assert!(config.tls.is_enabled());
}

#[test]
fn test_show_output_hides_key_material() {
    let ws = Workspace::new();
    let config = build_from(&env(&[("TLS_CRT", CERT), ("TLS_KEY", EC_KEY)]), ws.path()).unwrap();

    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["tls"]["key"]["algorithm"]["type"], "ec");
    assert!(!json.to_string().contains("PRIVATE KEY"));
}
