//! Shared configuration and discovery record types

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr, SocketAddrV6};
use std::time::Duration;

/// Timeouts governing controller behaviour
#[derive(Debug, Clone)]
pub struct HapConfig {
    /// Per-attempt TCP dial timeout (default: 5 seconds)
    pub dial_timeout: Duration,

    /// Per-request deadline on an open connection (default: 15 seconds)
    pub request_timeout: Duration,

    /// Delay before the persistent-verify loop retries after a transient
    /// failure (default: 10 seconds)
    pub retry_timeout: Duration,
}

impl Default for HapConfig {
    fn default() -> Self {
        Self {
            dial_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
            retry_timeout: Duration::from_secs(10),
        }
    }
}

impl HapConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> HapConfigBuilder {
        HapConfigBuilder::default()
    }
}

/// Builder for [`HapConfig`]
#[derive(Debug, Clone, Default)]
pub struct HapConfigBuilder {
    config: HapConfig,
}

impl HapConfigBuilder {
    /// Set the per-attempt dial timeout
    #[must_use]
    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.config.dial_timeout = timeout;
        self
    }

    /// Set the per-request deadline
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the persistent-verify retry delay
    #[must_use]
    pub fn retry_timeout(mut self, timeout: Duration) -> Self {
        self.config.retry_timeout = timeout;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> HapConfig {
        self.config
    }
}

/// One `_hap._tcp` DNS-SD record as supplied by the discovery collaborator
#[derive(Debug, Clone, Default)]
pub struct DnssdEntry {
    /// Instance name; the device identity
    pub name: String,
    /// Advertised hostname
    pub hostname: String,
    /// Service port
    pub port: u16,
    /// All resolved addresses
    pub addresses: Vec<IpAddr>,
    /// Interface scope for IPv6 link-local addresses
    pub interface: Option<u32>,
    /// TXT key-value pairs
    pub txt: HashMap<String, String>,
}

impl DnssdEntry {
    /// Device id: older accessories put the MAC into a TXT `id` entry and
    /// callers must handle both spellings; the instance name wins otherwise.
    #[must_use]
    pub fn device_id(&self) -> &str {
        if self.name.is_empty() {
            self.txt.get("id").map_or("", String::as_str)
        } else {
            &self.name
        }
    }

    /// Candidate socket addresses in dialling order: IPv4 before IPv6, with
    /// the interface scope appended to IPv6 link-locals.
    #[must_use]
    pub fn socket_addrs(&self) -> Vec<SocketAddr> {
        let mut v4 = Vec::new();
        let mut v6 = Vec::new();

        for addr in &self.addresses {
            match addr {
                IpAddr::V4(ip) => v4.push(SocketAddr::new(IpAddr::V4(*ip), self.port)),
                IpAddr::V6(ip) => {
                    // fe80::/10 needs the interface scope to be routable
                    let link_local = (ip.segments()[0] & 0xffc0) == 0xfe80;
                    let scope = if link_local {
                        self.interface.unwrap_or(0)
                    } else {
                        0
                    };
                    v6.push(SocketAddr::V6(SocketAddrV6::new(*ip, self.port, 0, scope)));
                }
            }
        }

        v4.extend(v6);
        v4
    }

    /// Merge a fresh record into this one: new addresses are appended, the
    /// port and TXT data follow the latest announcement.
    pub fn merge(&mut self, other: &DnssdEntry) {
        for addr in &other.addresses {
            if !self.addresses.contains(addr) {
                self.addresses.push(*addr);
            }
        }
        if other.port != 0 {
            self.port = other.port;
        }
        if !other.hostname.is_empty() {
            self.hostname = other.hostname.clone();
        }
        if other.interface.is_some() {
            self.interface = other.interface;
        }
        for (k, v) in &other.txt {
            self.txt.insert(k.clone(), v.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn socket_addrs_orders_v4_first() {
        let entry = DnssdEntry {
            name: "Lamp".to_string(),
            port: 5001,
            addresses: vec![
                IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1)),
                IpAddr::V4(Ipv4Addr::new(192, 168, 1, 40)),
            ],
            interface: Some(3),
            ..Default::default()
        };

        let addrs = entry.socket_addrs();
        assert_eq!(addrs.len(), 2);
        assert!(addrs[0].is_ipv4());
        match addrs[1] {
            SocketAddr::V6(v6) => assert_eq!(v6.scope_id(), 3),
            SocketAddr::V4(_) => panic!("expected v6 candidate last"),
        }
    }

    #[test]
    fn merge_appends_new_addresses_only() {
        let mut entry = DnssdEntry {
            name: "Lamp".to_string(),
            port: 5001,
            addresses: vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))],
            ..Default::default()
        };

        entry.merge(&DnssdEntry {
            name: "Lamp".to_string(),
            port: 5002,
            addresses: vec![
                IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
                IpAddr::V4(Ipv4Addr::new(10, 0, 0, 3)),
            ],
            ..Default::default()
        });

        assert_eq!(entry.addresses.len(), 2);
        assert_eq!(entry.port, 5002);
    }

    #[test]
    fn device_id_falls_back_to_txt() {
        let mut txt = HashMap::new();
        txt.insert("id".to_string(), "AA:BB:CC:DD:EE:FF".to_string());
        let entry = DnssdEntry {
            txt,
            ..Default::default()
        };
        assert_eq!(entry.device_id(), "AA:BB:CC:DD:EE:FF");
    }
}
