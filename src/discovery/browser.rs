use crate::error::{HapError, Result};
use crate::types::DnssdEntry;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Discovery events
#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    /// An accessory appeared (or re-announced)
    Added(DnssdEntry),
    /// A known accessory updated its record
    Updated(DnssdEntry),
    /// An accessory disappeared; carries its instance name
    Removed(String),
}

/// mDNS browser for `_hap._tcp` accessories
pub struct HapBrowser;

impl HapBrowser {
    /// Start browsing; the stream yields add/update/remove events until
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the mDNS daemon cannot be initialised
    pub fn browse() -> Result<impl Stream<Item = DiscoveryEvent>> {
        HapBrowserStream::new()
    }
}

struct HapBrowserStream {
    mdns: mdns_sd::ServiceDaemon,
    stream: Box<dyn Stream<Item = mdns_sd::ServiceEvent> + Send + Unpin>,
    // fullname -> instance name, for remove events
    known: HashMap<String, String>,
}

impl HapBrowserStream {
    fn new() -> Result<Self> {
        let mdns = mdns_sd::ServiceDaemon::new()
            .map_err(|e| HapError::Protocol(format!("mDNS daemon failed to start: {e}")))?;

        let receiver = mdns
            .browse(super::HAP_SERVICE_TYPE)
            .map_err(|e| HapError::Protocol(format!("mDNS browse failed: {e}")))?;

        Ok(Self {
            mdns,
            stream: Box::new(receiver.into_stream()),
            known: HashMap::new(),
        })
    }

    fn process_event(&mut self, event: mdns_sd::ServiceEvent) -> Option<DiscoveryEvent> {
        match event {
            mdns_sd::ServiceEvent::ServiceResolved(info) => self.handle_resolved(&info),
            mdns_sd::ServiceEvent::ServiceRemoved(_, fullname) => self.handle_removed(&fullname),
            _ => None,
        }
    }

    fn handle_resolved(&mut self, info: &mdns_sd::ServiceInfo) -> Option<DiscoveryEvent> {
        let fullname = info.get_fullname().to_string();
        let name = instance_name(&fullname);

        let txt: HashMap<String, String> = info
            .get_properties()
            .iter()
            .map(|prop| (prop.key().to_string(), prop.val_str().to_string()))
            .collect();

        let entry = DnssdEntry {
            name: name.clone(),
            hostname: info.get_hostname().to_string(),
            port: info.get_port(),
            addresses: info.get_addresses().iter().copied().collect(),
            interface: None,
            txt,
        };

        let seen_before = self
            .known
            .insert(fullname, name)
            .is_some();

        Some(if seen_before {
            DiscoveryEvent::Updated(entry)
        } else {
            DiscoveryEvent::Added(entry)
        })
    }

    fn handle_removed(&mut self, fullname: &str) -> Option<DiscoveryEvent> {
        self.known.remove(fullname).map(DiscoveryEvent::Removed)
    }
}

// "Kitchen Light._hap._tcp.local." -> "Kitchen Light"
fn instance_name(fullname: &str) -> String {
    fullname
        .strip_suffix(&format!(".{}", super::HAP_SERVICE_TYPE))
        .unwrap_or(fullname)
        .to_string()
}

impl Stream for HapBrowserStream {
    type Item = DiscoveryEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let event = match Pin::new(&mut self.stream).poll_next(cx) {
                Poll::Ready(Some(event)) => event,
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            };

            if let Some(discovery_event) = self.process_event(event) {
                return Poll::Ready(Some(discovery_event));
            }
        }
    }
}

impl Drop for HapBrowserStream {
    fn drop(&mut self) {
        let _ = self.mdns.stop_browse(super::HAP_SERVICE_TYPE);
        let _ = self.mdns.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_name_strips_service_suffix() {
        assert_eq!(
            instance_name("Kitchen Light._hap._tcp.local."),
            "Kitchen Light"
        );
        assert_eq!(
            instance_name("With.Dots._hap._tcp.local."),
            "With.Dots"
        );
        assert_eq!(instance_name("bare-name"), "bare-name");
    }
}
