//! Channels are named, addressed sub-streams multiplexed over one cast
//! connection. Every channel is bound to a `(source, destination)` endpoint
//! pair and a namespace, and carries either JSON or raw text payloads.

use std::error;
use std::fmt;

use futures::sync::mpsc::UnboundedSender;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::proto::{CastMessage, CastMessage_PayloadType, CastMessage_ProtocolVersion};
use crate::{Inbound, Status};

pub mod connection;
pub mod heartbeat;
pub mod media;
pub mod receiver;

pub const DEFAULT_DESTINATION_ID: &str = "receiver-0";
pub const DEFAULT_SENDER_ID: &str = "sender-0";
/// Local endpoint id for every channel addressed to a launched application.
pub const DYNAMIC_SENDER_ID: &str = "client-13243";

#[derive(Debug)]
pub enum Error {
    EncodingMismatch(Encoding),
    Parse(serde_json::Error),
    Send,
    Serialize(serde_json::Error),
    StatusSend,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl error::Error for Error {}

/// Serialization mode of a channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    Json,
    Text,
}

#[derive(Clone, Debug)]
pub struct Channel {
    source: String,
    destination: String,
    namespace: String,
    encoding: Encoding,
    outbound: UnboundedSender<CastMessage>,
}

impl Channel {
    pub fn new(
        source: &str,
        destination: &str,
        namespace: &str,
        encoding: Encoding,
        outbound: UnboundedSender<CastMessage>,
    ) -> Self {
        Self {
            source: source.to_owned(),
            destination: destination.to_owned(),
            namespace: namespace.to_owned(),
            encoding,
            outbound,
        }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Send a structured payload. Only valid on `Encoding::Json` channels.
    pub fn send<T: Serialize>(&self, payload: &T) -> Result<(), Error> {
        if self.encoding != Encoding::Json {
            return Err(Error::EncodingMismatch(self.encoding));
        }
        let payload = serde_json::to_string(payload).map_err(Error::Serialize)?;
        self.deliver(payload)
    }

    /// Send a raw string payload. Only valid on `Encoding::Text` channels.
    pub fn send_text(&self, payload: &str) -> Result<(), Error> {
        if self.encoding != Encoding::Text {
            return Err(Error::EncodingMismatch(self.encoding));
        }
        self.deliver(payload.to_owned())
    }

    fn deliver(&self, payload: String) -> Result<(), Error> {
        trace!(
            "send on {} ({} -> {}): {}",
            self.namespace,
            self.source,
            self.destination,
            payload
        );
        let message = MessageBuilder::default()
            .namespace(&self.namespace)
            .source(&self.source)
            .destination(&self.destination)
            .payload(payload)
            .into_message();
        self.outbound
            .unbounded_send(message)
            .map_err(|_| Error::Send)
    }
}

pub trait Handler {
    type Payload: DeserializeOwned;

    fn namespace(&self) -> &str;

    fn channel(&self) -> &str;

    fn handle(&self, message: &CastMessage, payload: Self::Payload) -> Result<(), Error>;

    fn try_handle(&self, message: &CastMessage) -> Result<Option<()>, Error> {
        if message.get_namespace() != self.namespace() {
            return Ok(None);
        }
        trace!("found message for {} channel", self.channel());
        let payload =
            serde_json::from_str(message.get_payload_utf8()).map_err(Error::Parse)?;
        self.handle(message, payload).map(Some)
    }
}

/// Routes every inbound message to the system channel that owns its
/// namespace. Messages on any other namespace are delivered to the status
/// subscriber as `Status::Message`.
#[derive(Debug)]
pub struct Responder {
    connection: connection::Handler,
    heartbeat: heartbeat::Handler,
    receiver: receiver::Handler,
    status: UnboundedSender<Status>,
}

impl Responder {
    pub fn new(heartbeat: Channel, status: &UnboundedSender<Status>) -> Self {
        Self {
            connection: connection::Handler::new(status.clone()),
            heartbeat: heartbeat::Handler::new(heartbeat),
            receiver: receiver::Handler::new(status.clone()),
            status: status.clone(),
        }
    }

    pub fn handle(&self, message: &CastMessage) -> Result<(), Error> {
        // Try handlers in order of receive frequency
        if self.heartbeat.try_handle(message)?.is_none()
            && self.receiver.try_handle(message)?.is_none()
            && self.connection.try_handle(message)?.is_none()
        {
            let inbound = Inbound {
                source: message.get_source_id().to_owned(),
                destination: message.get_destination_id().to_owned(),
                namespace: message.get_namespace().to_owned(),
                payload: message.get_payload_utf8().to_owned(),
            };
            self.status
                .unbounded_send(Status::Message(Box::new(inbound)))
                .map_err(|_| Error::StatusSend)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MessageBuilder<'a> {
    namespace: Option<&'a str>,
    source: Option<&'a str>,
    destination: Option<&'a str>,
    payload: Option<String>,
}

impl<'a> MessageBuilder<'a> {
    pub fn namespace(mut self, namespace: &'a str) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn source(mut self, source: &'a str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn destination(mut self, destination: &'a str) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn payload(mut self, payload: String) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn into_message(mut self) -> CastMessage {
        let mut message = CastMessage::new();
        message.set_protocol_version(CastMessage_ProtocolVersion::CASTV2_1_0);
        if let Some(source) = self.source.take() {
            message.set_source_id(source.to_owned());
        }
        if let Some(destination) = self.destination.take() {
            message.set_destination_id(destination.to_owned());
        }
        if let Some(namespace) = self.namespace.take() {
            message.set_namespace(namespace.to_owned());
        }
        message.set_payload_type(CastMessage_PayloadType::STRING);
        message.set_payload_utf8(self.payload.take().unwrap_or_default());
        message
    }
}
