use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use futures::prelude::*;
use futures::sync::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use stream_util::{self, Cancelable, Drainable, Trigger};
use tokio_codec::Framed;

use crate::channel::{
    connection, heartbeat, receiver, Channel, Encoding, Responder, DEFAULT_DESTINATION_ID,
    DEFAULT_SENDER_ID, DYNAMIC_SENDER_ID,
};
use crate::codec::CastMessageCodec;
use crate::proto::CastMessage;
use crate::worker::{self, HEARTBEAT_INTERVAL};
use crate::{tls_connect, Error, Status};

/// One cast connection and the channels multiplexed over it.
///
/// Dropping a `Session` shuts it down: the heartbeat and read loop stop,
/// queued messages are flushed and the socket is closed.
#[derive(Debug)]
pub struct Session {
    outbound: UnboundedSender<CastMessage>,
    connection: Channel,
    heartbeat: Channel,
    receiver: Channel,
    dynamic: Vec<Channel>,
    shutdown: Option<Trigger>,
}

impl Session {
    /// Connect to a receiver, start the session workers and open the virtual
    /// connection to `receiver-0`.
    pub fn open(
        addr: SocketAddr,
    ) -> impl Future<Item = (Self, UnboundedReceiver<Status>), Error = Error> {
        tls_connect(addr)
            .map_err(Error::Connection)
            .and_then(move |socket| {
                info!("TLS connection established to {}", addr);
                let (sink, source) = Framed::new(socket, CastMessageCodec::default()).split();
                Self::start(sink, source, HEARTBEAT_INTERVAL)
            })
    }

    /// Start the write, read and heartbeat workers over a framed transport,
    /// then send `CONNECT` to `receiver-0`.
    ///
    /// Must be called from within a tokio executor.
    pub fn start<Si, St>(
        sink: Si,
        source: St,
        heartbeat_period: Duration,
    ) -> Result<(Self, UnboundedReceiver<Status>), Error>
    where
        Si: Sink<SinkItem = CastMessage, SinkError = io::Error> + Send + 'static,
        St: Stream<Item = CastMessage, Error = io::Error> + Send + 'static,
    {
        let (outbound_tx, outbound_rx) = unbounded();
        let (status_tx, status_rx) = unbounded();
        let (trigger, valve) = stream_util::valve();

        let mut session = Self::from_outbound(outbound_tx);
        session.shutdown = Some(trigger);

        let write = worker::write(sink, outbound_rx.drain(valve.clone()));
        tokio_executor::spawn(write);
        let responder = Responder::new(session.heartbeat.clone(), &status_tx);
        let read = worker::read(source.cancel(valve.clone()), responder);
        tokio_executor::spawn(read);
        let heartbeat = worker::heartbeat(valve, session.heartbeat.clone(), heartbeat_period);
        tokio_executor::spawn(heartbeat);

        session.connection.send(&connection::Request::connect())?;
        Ok((session, status_rx))
    }

    /// Build the system channels over an existing outbound queue. No workers
    /// are started and no `CONNECT` is sent.
    pub fn from_outbound(outbound: UnboundedSender<CastMessage>) -> Self {
        let system = |namespace| {
            Channel::new(
                DEFAULT_SENDER_ID,
                DEFAULT_DESTINATION_ID,
                namespace,
                Encoding::Json,
                outbound.clone(),
            )
        };
        Self {
            connection: system(connection::NAMESPACE),
            heartbeat: system(heartbeat::NAMESPACE),
            receiver: system(receiver::NAMESPACE),
            dynamic: vec![],
            shutdown: None,
            outbound,
        }
    }

    pub fn connection(&self) -> &Channel {
        &self.connection
    }

    pub fn heartbeat(&self) -> &Channel {
        &self.heartbeat
    }

    pub fn receiver(&self) -> &Channel {
        &self.receiver
    }

    pub fn dynamic_channels(&self) -> &[Channel] {
        &self.dynamic
    }

    pub fn create_dynamic_channel(
        &mut self,
        local_id: &str,
        transport_id: &str,
        namespace: &str,
        encoding: Encoding,
    ) -> Channel {
        debug!(
            "opening {:?} channel {} -> {} on {}",
            encoding, local_id, transport_id, namespace
        );
        let channel = Channel::new(
            local_id,
            transport_id,
            namespace,
            encoding,
            self.outbound.clone(),
        );
        self.dynamic.push(channel.clone());
        channel
    }

    /// Open a virtual connection to a launched application.
    pub fn connect_app(&mut self, transport_id: &str) -> Result<Channel, Error> {
        let channel = self.create_dynamic_channel(
            DYNAMIC_SENDER_ID,
            transport_id,
            connection::NAMESPACE,
            Encoding::Json,
        );
        channel.send(&connection::Request::connect())?;
        Ok(channel)
    }

    pub fn shutdown(&mut self) {
        if let Some(trigger) = self.shutdown.take() {
            debug!("shutting down cast session");
            let _ = self.connection.send(&connection::Request::Close);
            trigger.terminate();
        }
        self.dynamic.clear();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Instant;

    use futures::future;
    use futures::sync::mpsc::unbounded;

    use super::*;
    use crate::channel::{media, MessageBuilder};

    fn message_type(message: &CastMessage) -> String {
        let payload: serde_json::Value =
            serde_json::from_str(message.get_payload_utf8()).unwrap();
        payload["type"].as_str().unwrap().to_owned()
    }

    #[test]
    fn started_session_connects_then_pings() {
        let period = Duration::from_millis(20);
        let (tx, rx) = mpsc::channel();
        tokio::run(future::lazy(move || {
            let (wire_tx, wire_rx) = unbounded();
            let sink = wire_tx.sink_map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe));
            let (inbound_tx, inbound_rx) = unbounded::<CastMessage>();
            let source = inbound_rx.map_err(|()| io::Error::from(io::ErrorKind::UnexpectedEof));
            let started = Instant::now();
            let (session, _status) = Session::start(sink, source, period).unwrap();
            wire_rx.take(4).collect().map(move |frames| {
                drop(session);
                drop(inbound_tx);
                tx.send((frames, started.elapsed())).unwrap();
            })
        }));
        let (frames, elapsed) = rx.recv().unwrap();
        assert_eq!(4, frames.len());

        let connect = &frames[0];
        assert_eq!(connection::NAMESPACE, connect.get_namespace());
        assert_eq!(DEFAULT_SENDER_ID, connect.get_source_id());
        assert_eq!(DEFAULT_DESTINATION_ID, connect.get_destination_id());
        assert_eq!("CONNECT", message_type(connect));

        for ping in &frames[1..] {
            assert_eq!(heartbeat::NAMESPACE, ping.get_namespace());
            assert_eq!(DEFAULT_DESTINATION_ID, ping.get_destination_id());
            assert_eq!("PING", message_type(ping));
        }
        assert!(elapsed >= period * 2);
    }

    #[test]
    fn started_session_answers_receiver_ping() {
        let (tx, rx) = mpsc::channel();
        tokio::run(future::lazy(move || {
            let (wire_tx, wire_rx) = unbounded();
            let sink = wire_tx.sink_map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe));
            let (inbound_tx, inbound_rx) = unbounded::<CastMessage>();
            let source = inbound_rx.map_err(|()| io::Error::from(io::ErrorKind::UnexpectedEof));
            let (mut session, _status) =
                Session::start(sink, source, HEARTBEAT_INTERVAL).unwrap();

            let ping = MessageBuilder::default()
                .source(DEFAULT_DESTINATION_ID)
                .destination(DEFAULT_SENDER_ID)
                .namespace(heartbeat::NAMESPACE)
                .payload(r#"{"type":"PING"}"#.to_owned())
                .into_message();
            inbound_tx.unbounded_send(ping).unwrap();

            wire_rx.take(2).collect().and_then(move |frames| {
                session.shutdown();
                drop(inbound_tx);
                tx.send(frames).unwrap();
                Ok(())
            })
        }));
        let frames = rx.recv().unwrap();
        assert_eq!("CONNECT", message_type(&frames[0]));
        assert_eq!(heartbeat::NAMESPACE, frames[1].get_namespace());
        assert_eq!("PONG", message_type(&frames[1]));
    }

    #[test]
    fn system_channels_use_fixed_endpoints() {
        let (tx, rx) = unbounded();
        let session = Session::from_outbound(tx);
        session
            .receiver()
            .send(&receiver::Request::Launch {
                request_id: 1,
                app_id: "CC1AD845".to_owned(),
            })
            .unwrap();
        session.heartbeat().send(&heartbeat::Request::Ping).unwrap();
        drop(session);
        let sent = rx.wait().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(2, sent.len());
        for message in &sent {
            assert_eq!(DEFAULT_SENDER_ID, message.get_source_id());
            assert_eq!(DEFAULT_DESTINATION_ID, message.get_destination_id());
        }
        assert_eq!(receiver::NAMESPACE, sent[0].get_namespace());
        assert_eq!(heartbeat::NAMESPACE, sent[1].get_namespace());
    }

    #[test]
    fn app_connection_targets_transport() {
        let (tx, rx) = unbounded();
        let mut session = Session::from_outbound(tx);
        session.connect_app("T1").unwrap();
        let media = session.create_dynamic_channel(
            DYNAMIC_SENDER_ID,
            "T1",
            media::NAMESPACE,
            Encoding::Json,
        );
        assert_eq!(2, session.dynamic_channels().len());
        assert_eq!("T1", media.destination());
        drop(media);
        drop(session);
        let sent = rx.wait().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(1, sent.len());
        assert_eq!(DYNAMIC_SENDER_ID, sent[0].get_source_id());
        assert_eq!("T1", sent[0].get_destination_id());
        assert_eq!(connection::NAMESPACE, sent[0].get_namespace());
        let payload: serde_json::Value =
            serde_json::from_str(sent[0].get_payload_utf8()).unwrap();
        assert_eq!("CONNECT", payload["type"]);
    }
}
