//! Resolve the target receiver from service advertisements.

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use futures::future;
use futures::prelude::*;
use futures::sync::oneshot;
use serde_derive::Serialize;

use crate::config::Filter;
use crate::Error;

mod browser;
mod txt;

pub use self::browser::MdnsBrowser;

/// Cast receivers listen on this port unless SRV says otherwise.
pub const DEFAULT_PORT: u16 = 8009;
/// Key in the DNS TXT record for the receiver's friendly name.
const FRIENDLY_NAME_KEY: &str = "fn";

/// A receiver resolved from one advertisement.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub addresses: Vec<IpAddr>,
    pub port: u16,
    pub metadata: BTreeMap<String, String>,
}

impl Device {
    /// The first address that can be connected to.
    pub fn address(&self) -> Option<IpAddr> {
        self.addresses
            .iter()
            .cloned()
            .find(|addr| !addr.is_unspecified() && !addr.is_multicast())
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.address().map(|addr| SocketAddr::new(addr, self.port))
    }
}

/// Accumulates the records of one advertisement into a `Device`.
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    instance: Option<String>,
    addresses: Vec<IpAddr>,
    port: Option<u16>,
    metadata: BTreeMap<String, String>,
}

impl DeviceBuilder {
    pub fn address(&mut self, addr: IpAddr) -> &mut Self {
        if !self.addresses.contains(&addr) {
            self.addresses.push(addr);
        }
        self
    }

    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    /// Service instance name, e.g. `Chromecast-4f3c._googlecast._tcp.local`.
    pub fn instance(&mut self, name: &str) -> &mut Self {
        let label = name.split("._").next().unwrap_or(name);
        if !label.is_empty() {
            self.instance = Some(label.to_owned());
        }
        self
    }

    pub fn txt<T: AsRef<str>>(&mut self, strings: &[T]) -> &mut Self {
        self.metadata.extend(txt::parse(strings));
        self
    }

    /// `None` until the advertisement carries a name and an address.
    pub fn build(self) -> Option<Device> {
        let name = self
            .metadata
            .get(FRIENDLY_NAME_KEY)
            .cloned()
            .filter(|name| !name.is_empty())
            .or(self.instance)?;
        if self.addresses.is_empty() {
            return None;
        }
        Some(Device {
            name,
            addresses: self.addresses,
            port: self.port.unwrap_or(DEFAULT_PORT),
            metadata: self.metadata,
        })
    }
}

/// A source of receiver advertisements.
pub trait Browse {
    /// Browse for up to `window`, calling `visit` for each advertised device
    /// until it returns `true`.
    fn browse(&self, window: Duration, visit: &mut dyn FnMut(Device) -> bool)
        -> Result<(), Error>;
}

/// Browse until `filter` accepts a device.
pub fn resolve(browser: &dyn Browse, filter: &Filter, window: Duration) -> Result<Device, Error> {
    if !filter.has_criteria() {
        return Err(Error::NoDiscoveryCriteria);
    }
    let mut found = None;
    browser.browse(window, &mut |device| {
        trace!("discovered {} at {:?}", device.name, device.addresses);
        if filter.matches(&device.name) {
            found = Some(device);
            true
        } else {
            false
        }
    })?;
    found.ok_or(Error::DeviceNotFound)
}

/// Run `resolve` on a dedicated thread so browsing never blocks the runtime.
pub fn discover(
    browser: Arc<dyn Browse + Send + Sync>,
    filter: Filter,
    window: Duration,
) -> impl Future<Item = Device, Error = Error> {
    let (tx, rx) = oneshot::channel();
    let spawned = thread::Builder::new()
        .name("cast-discovery".to_owned())
        .spawn(move || {
            let _ = tx.send(resolve(&*browser, &filter, window));
        });
    let spawned = spawned.map_err(|err| Error::Discovery(err.to_string()));
    future::result(spawned).and_then(|_| {
        rx.map_err(|_| Error::Discovery("discovery thread exited".to_owned()))
            .and_then(|resolved| resolved)
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Replays a fixed list of advertisements.
    #[derive(Debug, Default)]
    pub struct FakeBrowser {
        pub devices: Vec<Device>,
        pub passes: Mutex<usize>,
    }

    impl FakeBrowser {
        pub fn new(devices: Vec<Device>) -> Self {
            Self {
                devices,
                passes: Mutex::new(0),
            }
        }

        pub fn passes(&self) -> usize {
            *self.passes.lock().unwrap()
        }
    }

    impl Browse for FakeBrowser {
        fn browse(
            &self,
            _: Duration,
            visit: &mut dyn FnMut(Device) -> bool,
        ) -> Result<(), Error> {
            *self.passes.lock().unwrap() += 1;
            for device in &self.devices {
                if visit(device.clone()) {
                    break;
                }
            }
            Ok(())
        }
    }

    pub fn device(name: &str, addr: &str) -> Device {
        let mut builder = DeviceBuilder::default();
        builder
            .address(addr.parse().unwrap())
            .txt(&[format!("fn={}", name), "md=Chromecast".to_owned()]);
        builder.build().unwrap()
    }

    #[test]
    fn builder_prefers_friendly_name() {
        let mut builder = DeviceBuilder::default();
        builder
            .instance("Chromecast-4f3c._googlecast._tcp.local")
            .address("10.0.0.5".parse().unwrap())
            .address("10.0.0.5".parse().unwrap())
            .port(8010)
            .txt(&["fn=Den TV", "id=4f3c"]);
        let device = builder.build().unwrap();
        assert_eq!("Den TV", device.name);
        assert_eq!(1, device.addresses.len());
        assert_eq!(Some("10.0.0.5:8010".parse().unwrap()), device.socket_addr());
        assert_eq!(Some("4f3c"), device.metadata.get("id").map(String::as_str));
    }

    #[test]
    fn builder_falls_back_to_instance_name_and_default_port() {
        let mut builder = DeviceBuilder::default();
        builder
            .instance("Chromecast-4f3c._googlecast._tcp.local")
            .address("fe80::1".parse().unwrap());
        let device = builder.build().unwrap();
        assert_eq!("Chromecast-4f3c", device.name);
        assert_eq!(DEFAULT_PORT, device.port);
    }

    #[test]
    fn builder_needs_name_and_address() {
        let mut nameless = DeviceBuilder::default();
        nameless.address("10.0.0.5".parse().unwrap());
        assert_eq!(None, nameless.build());
        let mut unaddressed = DeviceBuilder::default();
        unaddressed.txt(&["fn=Den TV"]);
        assert_eq!(None, unaddressed.build());
    }

    #[test]
    fn first_usable_address_wins() {
        let mut den = device("Den TV", "0.0.0.0");
        den.addresses.push("224.0.0.251".parse().unwrap());
        assert_eq!(None, den.address());
        den.addresses.push("10.0.0.7".parse().unwrap());
        den.addresses.push("10.0.0.8".parse().unwrap());
        assert_eq!(Some("10.0.0.7".parse().unwrap()), den.address());
    }

    #[test]
    fn resolve_pinned_name() {
        let browser = FakeBrowser::new(vec![
            device("Kitchen", "10.0.0.4"),
            device("Den TV", "10.0.0.5"),
        ]);
        let filter = Filter {
            auto_discovery: false,
            target_name: Some("den tv".to_owned()),
        };
        let found = resolve(&browser, &filter, Duration::from_secs(1)).unwrap();
        assert_eq!("Den TV", found.name);
    }

    #[test]
    fn resolve_auto_takes_first_responder() {
        let browser = FakeBrowser::new(vec![
            device("Kitchen", "10.0.0.4"),
            device("Den TV", "10.0.0.5"),
        ]);
        let filter = Filter {
            auto_discovery: true,
            target_name: None,
        };
        let found = resolve(&browser, &filter, Duration::from_secs(1)).unwrap();
        assert_eq!("Kitchen", found.name);
    }

    #[test]
    fn resolve_without_criteria_does_not_browse() {
        let browser = FakeBrowser::new(vec![device("Kitchen", "10.0.0.4")]);
        match resolve(&browser, &Filter::default(), Duration::from_secs(1)) {
            Err(Error::NoDiscoveryCriteria) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(0, browser.passes());
    }

    #[test]
    fn discover_reports_missing_device() {
        let browser = Arc::new(FakeBrowser::new(vec![device("Kitchen", "10.0.0.4")]));
        let filter = Filter {
            auto_discovery: false,
            target_name: Some("Den TV".to_owned()),
        };
        match discover(browser, filter, Duration::from_secs(1)).wait() {
            Err(Error::DeviceNotFound) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }
}
