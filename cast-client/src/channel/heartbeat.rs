use serde_derive::{Deserialize, Serialize};

use crate::channel::{self, Channel, Error};
use crate::proto::CastMessage;

const CHANNEL: &str = "heartbeat";
pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.tp.heartbeat";

/// Answers receiver pings on the session's heartbeat channel.
#[derive(Debug)]
pub struct Handler {
    heartbeat: Channel,
}

impl Handler {
    pub fn new(heartbeat: Channel) -> Self {
        Self { heartbeat }
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

    fn handle(&self, _: &CastMessage, payload: Self::Payload) -> Result<(), Error> {
        trace!("{} got {:?}", self.channel(), payload);
        match payload {
            Response::Ping => self.heartbeat.send(&Request::Pong),
            Response::Pong => Ok(()),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    Ping,
    Pong,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    Ping,
    Pong,
}

#[cfg(test)]
mod tests {
    use futures::sync::mpsc::unbounded;
    use futures::Stream;

    use super::*;
    use crate::channel::{
        Encoding, Handler as _, MessageBuilder, DEFAULT_DESTINATION_ID, DEFAULT_SENDER_ID,
    };

    #[test]
    fn ping_is_answered_with_pong() {
        let (tx, rx) = unbounded();
        let channel = Channel::new(
            DEFAULT_SENDER_ID,
            DEFAULT_DESTINATION_ID,
            NAMESPACE,
            Encoding::Json,
            tx,
        );
        let handler = Handler::new(channel);
        let ping = MessageBuilder::default()
            .namespace(NAMESPACE)
            .source(DEFAULT_DESTINATION_ID)
            .destination(DEFAULT_SENDER_ID)
            .payload(r#"{"type":"PING"}"#.to_owned())
            .into_message();
        assert_eq!(Some(()), handler.try_handle(&ping).unwrap());
        drop(handler);
        let sent = rx.wait().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(1, sent.len());
        assert_eq!(r#"{"type":"PONG"}"#, sent[0].get_payload_utf8());
        assert_eq!(DEFAULT_DESTINATION_ID, sent[0].get_destination_id());
    }
}
