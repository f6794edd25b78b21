//! Line-delimited JSON boundary to the host runtime.

use std::io::{self, Write};

use serde_derive::{Deserialize, Serialize};

use crate::config::Options;
use crate::discovery::Device;

/// Topic of device resolution events.
pub const ECHO_TOPIC: &str = "echo";
const BROADCAST: &str = "*";

/// One line from the host.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    Message {
        #[serde(default)]
        payload: Option<serde_json::Value>,
    },
    Config {
        #[serde(default)]
        options: Options,
    },
}

impl Envelope {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str(line) {
            Ok(envelope) => Some(envelope),
            Err(err) => {
                debug!("ignoring host line: {}", err);
                None
            }
        }
    }
}

/// Event sent to the host.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub devices: Vec<String>,
    pub topic: String,
    pub payload: serde_json::Value,
}

impl Event {
    /// Announce a resolved device to every subscriber.
    pub fn device_up(device: &Device) -> Self {
        Self {
            devices: vec![BROADCAST.to_owned()],
            topic: ECHO_TOPIC.to_owned(),
            payload: serde_json::to_value(device).unwrap_or(serde_json::Value::Null),
        }
    }
}

pub trait Emit {
    fn emit(&self, event: Event);
}

/// Writes each event as one JSON line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Emit for Stdout {
    fn emit(&self, event: Event) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(err) => {
                warn!("Error serializing event: {}", err);
                return;
            }
        };
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(err) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!("Error writing event: {}", err);
        }
    }
}
