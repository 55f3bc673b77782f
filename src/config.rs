//! Configuration loading and types for the provisioner.
//!
//! Configuration is read from a YAML file and deserialized into the
//! [`Config`] struct.  Besides listener, logging and observability
//! settings it lists the backend connections, each pairing an object-store
//! endpoint with an identity control-plane endpoint.
//!
//! Every problem found here is fatal at startup and reported as
//! [`ProvisionerError::InvalidConfiguration`].

use garde::Validate;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::errors::ProvisionerError;

/// Account name prefixed to every grantee's display name when unset.
pub const DEFAULT_ACCOUNT_NAME: &str = "cosi-iam-user";

/// Region reported to grantees when unset.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    /// Listener settings.
    #[serde(default)]
    #[garde(skip)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    #[garde(skip)]
    pub logging: LoggingConfig,

    /// Observability settings.
    #[serde(default)]
    #[garde(skip)]
    pub observability: ObservabilityConfig,

    /// Backend connections.  At least one is required.
    #[serde(default)]
    #[garde(length(min = 1), dive)]
    pub connections: Vec<ConnectionConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Name reported by `GetInfo`.
    #[serde(default = "default_driver_name")]
    pub driver_name: String,

    /// Grace period for in-flight requests on shutdown, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            driver_name: default_driver_name(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics collection and the `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { metrics: true }
    }
}

/// One backend: an object store plus its identity control plane.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Backend id callers select with the `id` parameter.
    #[serde(default)]
    #[garde(length(min = 1))]
    pub id: String,

    /// Object-store data plane.
    #[garde(dive)]
    pub object_store: ObjectStoreConfig,

    /// Identity control plane (also accepted as `prismCentral`).
    #[serde(alias = "prismCentral")]
    #[garde(dive)]
    pub identity: IdentityConfig,

    /// Prefix for grantee display names.
    #[serde(default)]
    #[garde(skip)]
    pub account_name: Option<String>,

    /// Region handed to grantees.
    #[serde(default)]
    #[garde(skip)]
    pub region: Option<String>,
}

impl ConnectionConfig {
    pub fn account_name(&self) -> &str {
        non_empty_or(&self.account_name, DEFAULT_ACCOUNT_NAME)
    }

    pub fn region(&self) -> &str {
        non_empty_or(&self.region, DEFAULT_REGION)
    }
}

/// Object-store endpoint and admin credentials.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStoreConfig {
    #[serde(default)]
    #[garde(url)]
    pub endpoint: String,

    #[serde(default)]
    #[garde(length(min = 1))]
    pub access_key: String,

    #[serde(default)]
    #[garde(length(min = 1))]
    pub secret_key: String,
}

/// Identity control-plane endpoint and bootstrap credentials.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IdentityConfig {
    #[serde(default)]
    #[garde(url)]
    pub endpoint: String,

    #[serde(default)]
    #[garde(length(min = 1))]
    pub username: String,

    #[serde(default)]
    #[garde(length(min = 1))]
    pub password: String,

    /// Skip TLS certificate verification.
    #[serde(default)]
    #[garde(skip)]
    pub insecure: bool,
}

// -- Defaults ----------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9013
}

fn default_driver_name() -> String {
    "bucket-provisioner.objectstorage.k8s.io".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn non_empty_or<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}

// -- Loader ------------------------------------------------------------------

/// Load, parse and validate configuration from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ProvisionerError> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {}
        _ => {
            return Err(ProvisionerError::config(format!(
                "{}: invalid file extension, should be .yaml or .yml",
                path.display()
            )))
        }
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| ProvisionerError::config(format!("{}: {e}", path.display())))?;
    parse_config(&contents)
}

/// Parse and validate configuration from YAML text.
pub fn parse_config(contents: &str) -> Result<Config, ProvisionerError> {
    let config: Config =
        serde_yaml::from_str(contents).map_err(|e| ProvisionerError::config(e.to_string()))?;
    config
        .validate()
        .map_err(|report| ProvisionerError::config(report.to_string()))?;
    debug!("Configuration parsed: {} connection(s)", config.connections.len());
    Ok(config)
}

/// Check that an identity endpoint's host resolves.
pub async fn check_endpoint(endpoint: &str) -> Result<(), ProvisionerError> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| ProvisionerError::config(format!("endpoint '{endpoint}': {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| ProvisionerError::config(format!("endpoint '{endpoint}' has no host")))?;
    let port = url.port_or_known_default().unwrap_or(443);

    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| ProvisionerError::config(format!("endpoint '{endpoint}': {e}")))?;
    if addrs.next().is_none() {
        return Err(ProvisionerError::config(format!(
            "endpoint '{endpoint}': no addresses found for host {host}"
        )));
    }
    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
connections:
  - id: east
    objectStore:
      endpoint: http://objects.east:80
      accessKey: admin-ak
      secretKey: admin-sk
    identity:
      endpoint: https://pc.east:9440
      username: admin
      password: secret
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9013);
        assert_eq!(config.server.shutdown_timeout, 30);
        assert_eq!(
            config.server.driver_name,
            "bucket-provisioner.objectstorage.k8s.io"
        );
        assert_eq!(config.logging.format, "text");
        assert!(config.observability.metrics);

        let conn = &config.connections[0];
        assert_eq!(conn.id, "east");
        assert_eq!(conn.account_name(), DEFAULT_ACCOUNT_NAME);
        assert_eq!(conn.region(), DEFAULT_REGION);
        assert!(!conn.identity.insecure);
    }

    #[test]
    fn test_prism_central_alias_and_overrides() {
        let yaml = r#"
connections:
  - id: west
    objectStore: { endpoint: "http://objects.west", accessKey: a, secretKey: s }
    prismCentral: { endpoint: "https://pc.west:9440", username: u, password: p, insecure: true }
    accountName: team-a
    region: eu-west-1
"#;
        let config = parse_config(yaml).unwrap();
        let conn = &config.connections[0];
        assert_eq!(conn.identity.username, "u");
        assert!(conn.identity.insecure);
        assert_eq!(conn.account_name(), "team-a");
        assert_eq!(conn.region(), "eu-west-1");
    }

    #[test]
    fn test_empty_override_falls_back_to_default() {
        let yaml = MINIMAL.replace("      password: secret\n", "      password: secret\n    region: \"\"\n");
        let config = parse_config(&yaml).unwrap();
        assert_eq!(config.connections[0].region(), DEFAULT_REGION);
    }

    #[test]
    fn test_no_connections_rejected() {
        let err = parse_config("server:\n  port: 1234\n").unwrap_err();
        assert!(matches!(err, ProvisionerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let yaml = MINIMAL.replace("      password: secret\n", "");
        let err = parse_config(&yaml).unwrap_err();
        assert!(err.to_string().contains("password"), "{err}");
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let yaml = MINIMAL.replace("http://objects.east:80", "not a url");
        let err = parse_config(&yaml).unwrap_err();
        assert!(matches!(err, ProvisionerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_missing_section_rejected() {
        let yaml = r#"
connections:
  - id: east
    identity: { endpoint: "https://pc", username: u, password: p }
"#;
        assert!(parse_config(yaml).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.connections.len(), 1);
    }

    #[test]
    fn test_load_config_rejects_extension() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("extension"));
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("/nonexistent/provisioner.yaml").is_err());
    }

    #[tokio::test]
    async fn test_check_endpoint_resolves_localhost() {
        check_endpoint("http://localhost:9440").await.unwrap();
    }

    #[tokio::test]
    async fn test_check_endpoint_rejects_unresolvable() {
        assert!(check_endpoint("https://pc.invalid:9440").await.is_err());
        assert!(check_endpoint("no-scheme").await.is_err());
    }
}
