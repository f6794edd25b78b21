//! The connection channel opens and closes virtual connections between a
//! sender endpoint and a receiver endpoint.

use futures::sync::mpsc::UnboundedSender;
use serde_derive::{Deserialize, Serialize};

use crate::channel::{self, Error, DEFAULT_DESTINATION_ID};
use crate::proto::CastMessage;
use crate::Status;

const CHANNEL: &str = "connection";
pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.tp.connection";
const USER_AGENT: &str = "cast-trigger/cast-client";

#[derive(Debug)]
pub struct Handler {
    status: UnboundedSender<Status>,
}

impl Handler {
    pub fn new(status: UnboundedSender<Status>) -> Self {
        Self { status }
    }
}

impl channel::Handler for Handler {
    type Payload = Response;

    fn channel(&self) -> &str {
        CHANNEL
    }

    fn namespace(&self) -> &str {
        NAMESPACE
    }

    fn handle(&self, message: &CastMessage, _: Self::Payload) -> Result<(), Error> {
        let source = message.get_source_id();
        if source != DEFAULT_DESTINATION_ID {
            debug!("virtual connection to {} closed", source);
            return Ok(());
        }
        warn!("cast connection closed by receiver");
        self.status
            .unbounded_send(Status::Closed)
            .map_err(|_| Error::StatusSend)
    }
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    Connect { user_agent: String },
    Close,
}

impl Request {
    pub fn connect() -> Self {
        Request::Connect {
            user_agent: USER_AGENT.to_owned(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    Close,
}
