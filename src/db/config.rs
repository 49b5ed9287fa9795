use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::error::{DbError, Result};

/// Supported database drivers. Names deserialize case-insensitively, the
/// same way [`FromStr`] parses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DriverType {
    MongoDb,
    MySql,
}

impl DriverType {
    pub fn name(&self) -> &'static str {
        match self {
            DriverType::MongoDb => "MongoDB",
            DriverType::MySql => "MySQL",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            DriverType::MongoDb => 27017,
            DriverType::MySql => 3306,
        }
    }

    /// Cargo feature that compiles the driver in.
    pub fn feature_name(&self) -> &'static str {
        match self {
            DriverType::MongoDb => "mongodb",
            DriverType::MySql => "mysql",
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            DriverType::MongoDb => cfg!(feature = "mongodb"),
            DriverType::MySql => cfg!(feature = "mysql"),
        }
    }

    pub fn all() -> &'static [DriverType] {
        &[DriverType::MongoDb, DriverType::MySql]
    }
}

impl fmt::Display for DriverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DriverType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(DriverType::MongoDb),
            "mysql" => Ok(DriverType::MySql),
            _ => Err(DbError::UnknownDriver(s.to_string())),
        }
    }
}

impl TryFrom<String> for DriverType {
    type Error = DbError;

    fn try_from(name: String) -> Result<Self> {
        name.parse()
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Settings a driver needs to open a session.
///
/// `host` may carry its own port (`db1:27017`) or, for MongoDB, a cluster
/// list (`db1:27017,db2:27017`); `port` is used only for a bare host and
/// falls back to the driver's default when zero. `url` bypasses assembly
/// entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub driver: DriverType,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub certificate: Option<PathBuf>,
    #[serde(default)]
    pub private_key: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl DbConfig {
    pub fn new(driver: DriverType) -> Self {
        Self {
            driver,
            host: default_host(),
            port: driver.default_port(),
            username: None,
            password: None,
            database: None,
            url: None,
            certificate: None,
            private_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_url(driver: DriverType, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(driver)
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| DbError::InvalidConnectionString(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            self.driver.default_port()
        } else {
            self.port
        }
    }

    /// Username and password, only when both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    /// Host entries as `(host, port)` pairs, expanding `h:p` and `h1:p1,h2:p2`.
    pub fn host_list(&self) -> Result<Vec<(String, u16)>> {
        let mut hosts = Vec::new();
        for entry in self.host.split(',').map(str::trim).filter(|h| !h.is_empty()) {
            match entry.rsplit_once(':') {
                Some((host, port)) => {
                    let port = port.parse::<u16>().map_err(|_| {
                        let message = format!("invalid port in host entry: {entry}");
                        DbError::InvalidConnectionString(message)
                    })?;
                    hosts.push((host.to_string(), port));
                }
                None => hosts.push((entry.to_string(), self.effective_port())),
            }
        }
        if hosts.is_empty() {
            return Err(DbError::InvalidConnectionString("no host configured".into()));
        }
        Ok(hosts)
    }
}
