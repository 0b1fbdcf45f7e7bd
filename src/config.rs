//! Server and client configuration.
//!
//! Both are read from JSON files; every field has a default so a partial
//! file (or no file at all) is enough.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, time::Duration};

/// Where the discovery registry listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAddress {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_registry_port")]
    pub port: u16,
}

impl RegistryAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub(crate) fn to_socket_addrs(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl Default for RegistryAddress {
    fn default() -> Self {
        Self::new(default_host(), default_registry_port())
    }
}

impl fmt::Display for RegistryAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Whether the server starts its own registry or joins a running one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryMode {
    #[default]
    Create,
    Locate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub registry: RegistryAddress,

    /// Name the endpoint is bound under
    #[serde(default = "default_binding_name")]
    pub binding_name: String,

    /// Host the exported endpoint listens on; its port is always ephemeral
    #[serde(default = "default_host")]
    pub export_host: String,

    #[serde(default)]
    pub registry_mode: RegistryMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            registry: RegistryAddress::default(),
            binding_name: default_binding_name(),
            export_host: default_host(),
            registry_mode: RegistryMode::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_json(path.as_ref())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_empty("registry.host", &self.registry.host)?;
        non_empty("binding_name", &self.binding_name)?;
        non_empty("export_host", &self.export_host)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Sent as the argument of every `ping`
    #[serde(default = "default_client_name")]
    pub name: String,

    #[serde(default)]
    pub registry: RegistryAddress,

    /// Name to look up; must match the server's `binding_name`
    #[serde(default = "default_binding_name")]
    pub binding_name: String,

    /// Per-call timeout. Absent means wait as long as it takes.
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: default_client_name(),
            registry: RegistryAddress::default(),
            binding_name: default_binding_name(),
            call_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_json(path.as_ref())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_empty("name", &self.name)?;
        non_empty("registry.host", &self.registry.host)?;
        non_empty("binding_name", &self.binding_name)?;
        if self.call_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "call_timeout_ms must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_owned(),
        source,
    })
}

fn non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn default_host() -> String {
    "localhost".to_owned()
}

fn default_registry_port() -> u16 {
    1099
}

fn default_binding_name() -> String {
    "server".to_owned()
}

fn default_client_name() -> String {
    "client".to_owned()
}
