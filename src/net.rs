//! LAN address discovery for building the shareable URL.

use std::net::{IpAddr, Ipv4Addr};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no network interface besides loopback")]
    InterfaceNotFound,
    #[error("no IPv4 address on interface {0}")]
    NoIpv4Address(String),
}

/// Picks the first IPv4 address of the first non-loopback interface.
///
/// First match wins — no routing-metric ranking, so multi-homed hosts may
/// get a suboptimal address. Known limitation.
pub fn first_lan_ipv4<I>(interfaces: I) -> Result<Ipv4Addr, ResolveError>
where
    I: IntoIterator<Item = (String, IpAddr)>,
{
    let mut chosen: Option<String> = None;

    for (name, addr) in interfaces {
        if name == "lo" || addr.is_loopback() {
            continue;
        }
        match &chosen {
            None => chosen = Some(name.clone()),
            Some(picked) if *picked != name => continue,
            Some(_) => {}
        }
        if let IpAddr::V4(v4) = addr {
            return Ok(v4);
        }
    }

    match chosen {
        Some(name) => Err(ResolveError::NoIpv4Address(name)),
        None => Err(ResolveError::InterfaceNotFound),
    }
}

/// Enumerates the host's interfaces and resolves the advertised IPv4.
pub fn resolve_lan_ip() -> anyhow::Result<Ipv4Addr> {
    let interfaces = local_ip_address::list_afinet_netifas()
        .map_err(|err| anyhow::anyhow!("failed to enumerate network interfaces: {err}"))?;
    Ok(first_lan_ipv4(interfaces)?)
}
