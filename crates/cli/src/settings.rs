use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};

/// Port to listen on; set by most container platforms.
pub const PORT_VAR: &str = "PORT";
pub const DEFAULT_PORT: u16 = 8080;

/// Address the HTTP server binds to.
pub fn listen_address(port: Option<&str>) -> Result<SocketAddr> {
    let port = match port.map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => raw
            .parse::<u16>()
            .with_context(|| format!("invalid value '{raw}' for {PORT_VAR}"))?,
        None => DEFAULT_PORT,
    };
    Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
}
