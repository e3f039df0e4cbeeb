use serde::{Deserialize, Serialize};
use tiberius::{AuthMethod, Config as TiberiusConfig};

use super::connection::MssqlConnection;
use crate::error::DbLibError;

pub(crate) const DEFAULT_PORT: u16 = 1433;

/// Options for connecting to SQL Server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MssqlOptions {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub instance_name: Option<String>,
    /// Accept the server certificate without validation.
    #[serde(default = "default_trust_cert")]
    pub trust_cert: bool,
}

fn default_trust_cert() -> bool {
    true
}

impl MssqlOptions {
    #[must_use]
    pub fn new(
        server: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
            port: None,
            instance_name: None,
            trust_cert: true,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_instance_name(mut self, instance_name: Option<String>) -> Self {
        self.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn with_trust_cert(mut self, trust_cert: bool) -> Self {
        self.trust_cert = trust_cert;
        self
    }

    #[must_use]
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    #[must_use]
    pub fn to_tiberius_config(&self) -> TiberiusConfig {
        let mut config = TiberiusConfig::new();
        config.host(&self.server);
        config.database(&self.database);
        config.port(self.port_or_default());
        config.authentication(AuthMethod::sql_server(&self.user, &self.password));
        if let Some(instance) = &self.instance_name {
            config.instance_name(instance);
        }
        if self.trust_cert {
            config.trust_cert();
        }
        config
    }

    /// # Errors
    /// Returns `DbLibError::ConnectionError` if the server cannot be reached or rejects the login.
    pub fn connect(&self) -> Result<MssqlConnection, DbLibError> {
        MssqlConnection::connect(self)
    }
}
