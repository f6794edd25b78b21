use std::time::Duration;

use mdns::{RecordKind, Response};

use crate::discovery::{Browse, Device, DeviceBuilder};
use crate::Error;

/// Cast receiver multicast service identifier.
const SERVICE_NAME: &str = "_googlecast._tcp.local";

/// Browses the local network for cast receivers with multicast DNS.
#[derive(Debug, Default, Clone, Copy)]
pub struct MdnsBrowser;

fn device(response: &Response) -> Option<Device> {
    let mut builder = DeviceBuilder::default();
    for record in response.records() {
        match record.kind {
            RecordKind::A(v4) => {
                builder.address(v4.into());
            }
            RecordKind::AAAA(v6) => {
                builder.address(v6.into());
            }
            RecordKind::SRV { port, .. } => {
                builder.port(port).instance(&record.name);
            }
            RecordKind::PTR(ref instance) => {
                builder.instance(instance);
            }
            RecordKind::TXT(ref text) => {
                builder.txt(text);
            }
            _ => (),
        }
    }
    builder.build()
}

impl Browse for MdnsBrowser {
    fn browse(
        &self,
        window: Duration,
        visit: &mut dyn FnMut(Device) -> bool,
    ) -> Result<(), Error> {
        debug!("browsing {} for {:?}", SERVICE_NAME, window);
        let discovery =
            mdns::discover::all(SERVICE_NAME).map_err(|err| Error::Discovery(err.to_string()))?;
        for response in discovery.timeout(window) {
            let response = match response {
                Ok(response) => response,
                Err(err) => {
                    warn!("Error on mdns response: {}", err);
                    continue;
                }
            };
            if let Some(device) = device(&response) {
                if visit(device) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}
