//! mDNS/DNS-SD discovery of HAP accessories

mod browser;

pub use browser::{DiscoveryEvent, HapBrowser};

/// DNS-SD service type advertised by HAP-over-IP accessories
pub const HAP_SERVICE_TYPE: &str = "_hap._tcp.local.";
