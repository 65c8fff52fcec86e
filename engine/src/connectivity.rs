use std::time::Duration;

use log::debug;
use tokio::{net::TcpStream, time::timeout};

pub const GEMINI_HOST: &str = "generativelanguage.googleapis.com";
pub const HTTPS_PORT: u16 = 443;
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns true if a TCP handshake with `host:port` completes within `limit`.
pub async fn check_network(host: &str, port: u16, limit: Duration) -> bool {
    match timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("Connecting to {host}:{port} failed: {e}");
            false
        }
        Err(_) => {
            debug!("Connecting to {host}:{port} timed out after {limit:?}");
            false
        }
    }
}
