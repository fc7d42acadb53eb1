//! Admin access check
//!
//! Decides whether a client address falls inside one of the configured admin
//! networks. Networks are CIDR strings (`10.0.0.0/8`, `::1/128`) or bare
//! addresses, which count as single-host networks. Host bits set below the
//! prefix are ignored. Anything unparseable never matches.

use std::net::IpAddr;

/// A parsed CIDR network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpNetwork {
    addr: IpAddr,
    prefix: u8,
}

impl IpNetwork {
    /// Parse `addr/prefix` or a bare address. Returns `None` when malformed.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (addr, prefix) = match raw.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (raw, None),
        };

        let addr: IpAddr = addr.trim().parse().ok()?;
        let max = max_prefix(&addr);
        let prefix = match prefix {
            Some(p) => {
                let p = p.trim();
                if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                p.parse::<u8>().ok().filter(|p| *p <= max)?
            }
            None => max,
        };

        Some(Self { addr, prefix })
    }

    /// Whether `ip` lies inside this network. Address families never mix.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = prefix_mask_u32(self.prefix);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = prefix_mask_u128(self.prefix);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

fn max_prefix(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn prefix_mask_u32(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p => u32::MAX << (32 - u32::from(p)),
    }
}

fn prefix_mask_u128(prefix: u8) -> u128 {
    match prefix {
        0 => 0,
        p => u128::MAX << (128 - u32::from(p)),
    }
}

/// Collapse IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) to IPv4
pub fn canonical_client_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

/// Whether `client` may use the admin panel under `networks`
pub fn is_ip_allowed(client: IpAddr, networks: &[String]) -> bool {
    let client = canonical_client_ip(client);
    networks
        .iter()
        .filter_map(|raw| IpNetwork::parse(raw))
        .any(|network| network.contains(client))
}
