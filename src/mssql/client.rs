use std::net::ToSocketAddrs;

use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use super::config::MssqlOptions;
use crate::error::DbLibError;

pub type MssqlClient = Client<Compat<TcpStream>>;

/// Open a TDS session for `options`.
///
/// # Errors
/// Returns `DbLibError::ConnectionError` if the address does not resolve, the TCP connection
/// fails, or the login is rejected.
pub async fn create_mssql_client(options: &MssqlOptions) -> Result<MssqlClient, DbLibError> {
    let config = options.to_tiberius_config();
    let port = options.port_or_default();

    let server_addr = (options.server.as_str(), port)
        .to_socket_addrs()
        .map_err(|e| {
            DbLibError::ConnectionError(format!("Failed to resolve server address: {e}"))
        })?
        .next()
        .ok_or_else(|| {
            DbLibError::ConnectionError(format!("No valid address found for {}", options.server))
        })?;

    let tcp = TcpStream::connect(server_addr)
        .await
        .map_err(|e| DbLibError::ConnectionError(format!("TCP connection error: {e}")))?;
    tcp.set_nodelay(true)
        .map_err(|e| DbLibError::ConnectionError(format!("TCP configuration error: {e}")))?;

    Client::connect(config, tcp.compat_write())
        .await
        .map_err(|e| DbLibError::ConnectionError(format!("SQL Server connection error: {e}")))
}
