use serde::{Deserialize, Serialize};

use super::connection::PostgresConnection;
use crate::error::DbLibError;

/// Connection settings for a PostgreSQL server.
///
/// Every field is required by [`PostgresOptions::connect`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl PostgresOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn with_dbname(mut self, dbname: impl Into<String>) -> Self {
        self.dbname = Some(dbname.into());
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Check that all required fields are present.
    ///
    /// # Errors
    /// Returns `DbLibError::ConfigError` naming the first missing field.
    pub fn validate(&self) -> Result<(), DbLibError> {
        if self.dbname.is_none() {
            return Err(DbLibError::ConfigError("dbname is required".to_string()));
        }
        if self.host.is_none() {
            return Err(DbLibError::ConfigError("host is required".to_string()));
        }
        if self.port.is_none() {
            return Err(DbLibError::ConfigError("port is required".to_string()));
        }
        if self.user.is_none() {
            return Err(DbLibError::ConfigError("user is required".to_string()));
        }
        if self.password.is_none() {
            return Err(DbLibError::ConfigError("password is required".to_string()));
        }
        Ok(())
    }

    /// # Errors
    /// Returns `DbLibError::ConfigError` if a required field is missing.
    pub fn to_pg_config(&self) -> Result<tokio_postgres::Config, DbLibError> {
        self.validate()?;
        let mut config = tokio_postgres::Config::new();
        if let Some(host) = &self.host {
            config.host(host);
        }
        if let Some(port) = self.port {
            config.port(port);
        }
        if let Some(dbname) = &self.dbname {
            config.dbname(dbname);
        }
        if let Some(user) = &self.user {
            config.user(user);
        }
        if let Some(password) = &self.password {
            config.password(password);
        }
        Ok(config)
    }

    /// # Errors
    /// `ConfigError` for incomplete options, `ConnectionError` if the server is unreachable.
    pub fn connect(&self) -> Result<PostgresConnection, DbLibError> {
        PostgresConnection::connect(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_reported_in_order() {
        let opts = PostgresOptions::new().with_host("localhost");
        assert!(matches!(
            opts.validate(),
            Err(DbLibError::ConfigError(msg)) if msg == "dbname is required"
        ));
        let opts = opts.with_dbname("app").with_port(5432).with_user("app");
        assert!(matches!(
            opts.validate(),
            Err(DbLibError::ConfigError(msg)) if msg == "password is required"
        ));
    }

    #[test]
    fn builds_driver_config() -> Result<(), DbLibError> {
        let config = PostgresOptions::new()
            .with_host("db.internal")
            .with_port(6543)
            .with_dbname("app")
            .with_user("svc")
            .with_password("pw")
            .to_pg_config()?;
        assert_eq!(config.get_ports(), &[6543]);
        assert_eq!(config.get_dbname(), Some("app"));
        assert_eq!(config.get_user(), Some("svc"));
        Ok(())
    }
}
