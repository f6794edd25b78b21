use std::time::{Duration, Instant};

use futures::prelude::*;
use futures::sync::mpsc::UnboundedReceiver;
use tokio_timer::Delay;

use crate::launch::{Action, Event, Launch, LaunchedApp};
use crate::{Error, Session, Status};

/// Deadline from opening the connection to binding the launched app.
pub const LAUNCH_DEADLINE: Duration = Duration::from_secs(12);

/// A session bound to a launched receiver application.
#[derive(Debug)]
pub struct Bound {
    pub session: Session,
    pub status: UnboundedReceiver<Status>,
    pub app: LaunchedApp,
    /// The launch machine, left in `State::Bound`.
    pub launch: Launch,
}

/// Drives a [`Launch`] state machine over a session's status stream until the
/// requested application is bound, the launch fails or the deadline passes.
///
/// Resolving with an error drops the session, which shuts it down.
pub struct Handshake<F> {
    open: Option<F>,
    session: Option<(Session, UnboundedReceiver<Status>)>,
    launch: Launch,
    deadline: Delay,
}

impl<F> Handshake<F>
where
    F: Future<Item = (Session, UnboundedReceiver<Status>), Error = Error>,
{
    pub fn new(open: F, launch: Launch) -> Self {
        Self::with_deadline(open, launch, Instant::now() + LAUNCH_DEADLINE)
    }

    pub fn with_deadline(open: F, mut launch: Launch, deadline: Instant) -> Self {
        launch.step(Event::Open);
        Self {
            open: Some(open),
            session: None,
            launch,
            deadline: Delay::new(deadline),
        }
    }

    fn poll_deadline(&mut self) -> Result<(), Error> {
        match self.deadline.poll() {
            Ok(Async::NotReady) => return Ok(()),
            Ok(Async::Ready(())) => {}
            Err(err) => warn!("Error on launch deadline: {:?}", err),
        }
        self.launch.step(Event::Elapsed);
        Err(Error::Timeout)
    }

    fn poll_open(&mut self) -> Poll<(), Error> {
        if self.session.is_some() {
            return Ok(Async::Ready(()));
        }
        let (mut session, status) = match self.open.as_mut() {
            Some(open) => match open.poll()? {
                Async::Ready(opened) => opened,
                Async::NotReady => return Ok(Async::NotReady),
            },
            None => return Err(Error::Closed),
        };
        self.open = None;
        let action = self.launch.step(Event::Connected);
        apply(&mut session, action)?;
        self.session = Some((session, status));
        Ok(Async::Ready(()))
    }
}

impl<F> Future for Handshake<F>
where
    F: Future<Item = (Session, UnboundedReceiver<Status>), Error = Error>,
{
    type Item = Bound;
    type Error = Error;

    fn poll(&mut self) -> Poll<Self::Item, Self::Error> {
        self.poll_deadline()?;
        if let Async::NotReady = self.poll_open()? {
            return Ok(Async::NotReady);
        }
        loop {
            let (session, status) = match self.session.as_mut() {
                Some(opened) => opened,
                None => return Err(Error::Closed),
            };
            let reply = match status.poll() {
                Ok(Async::NotReady) => return Ok(Async::NotReady),
                Ok(Async::Ready(Some(Status::Receiver(reply)))) => Some(reply),
                Ok(Async::Ready(Some(Status::Message(inbound)))) => {
                    trace!("ignoring message on {} during launch", inbound.namespace);
                    continue;
                }
                Ok(Async::Ready(Some(Status::Closed))) | Ok(Async::Ready(None)) | Err(_) => None,
            };
            let action = match reply {
                Some(ref reply) => self.launch.step(Event::Reply(&**reply)),
                None => match self.launch.step(Event::Closed) {
                    None => return Err(Error::Closed),
                    action => action,
                },
            };
            if let Some(app) = apply(session, action)? {
                return match self.session.take() {
                    Some((session, status)) => Ok(Async::Ready(Bound {
                        session,
                        status,
                        app,
                        launch: self.launch.clone(),
                    })),
                    None => Err(Error::Closed),
                };
            }
        }
    }
}

fn apply(session: &mut Session, action: Option<Action>) -> Result<Option<LaunchedApp>, Error> {
    match action {
        None => Ok(None),
        Some(Action::Send(request)) => {
            session.receiver().send(&request)?;
            Ok(None)
        }
        Some(Action::Bind(app)) => {
            info!("{} launched on transport {}", app.app_id, app.transport_id);
            session.connect_app(&app.transport_id)?;
            Ok(Some(app))
        }
        Some(Action::Fail(failure)) => {
            warn!("launch failed: {}", failure);
            Err(failure.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    use futures::future::{self, FutureResult};
    use futures::sync::mpsc::{unbounded, UnboundedSender};

    use super::*;
    use crate::channel::connection;
    use crate::launch::State;
    use crate::proto::CastMessage;
    use crate::{Reply, RequestIds};

    const YOUTUBE: &str = "233637DE";

    type Opened = FutureResult<(Session, UnboundedReceiver<Status>), Error>;

    fn harness(
        seed: i64,
    ) -> (
        Handshake<Opened>,
        UnboundedReceiver<CastMessage>,
        UnboundedSender<Status>,
    ) {
        let (outbound, outbound_rx) = unbounded();
        let (status, status_rx) = unbounded();
        let open = future::ok((Session::from_outbound(outbound), status_rx));
        let launch = Launch::new(YOUTUBE, RequestIds::starting_at(seed));
        (Handshake::new(open, launch), outbound_rx, status)
    }

    fn push(status: &UnboundedSender<Status>, json: &str) {
        let reply = Reply::parse(json).unwrap().unwrap();
        status
            .unbounded_send(Status::Receiver(Box::new(reply)))
            .unwrap();
    }

    fn run<F>(handshake: Handshake<F>) -> Result<Bound, Error>
    where
        F: Future<Item = (Session, UnboundedReceiver<Status>), Error = Error> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        tokio::run(handshake.then(move |result| {
            tx.send(result).unwrap();
            Ok(())
        }));
        rx.recv().unwrap()
    }

    fn payloads(outbound: UnboundedReceiver<CastMessage>) -> Vec<(String, serde_json::Value)> {
        outbound
            .wait()
            .map(|message| {
                let message = message.unwrap();
                let payload = serde_json::from_str(message.get_payload_utf8()).unwrap();
                (message.get_destination_id().to_owned(), payload)
            })
            .collect()
    }

    #[test]
    fn binds_and_connects_to_the_launched_app() {
        let (handshake, outbound, status) = harness(500);
        push(
            &status,
            r#"{"requestId":500,"responseType":"GET_APP_AVAILABILITY","availability":{"233637DE":"APP_AVAILABLE"}}"#,
        );
        push(
            &status,
            r#"{"type":"RECEIVER_STATUS","requestId":0,"status":{"applications":[]}}"#,
        );
        push(
            &status,
            r#"{"type":"RECEIVER_STATUS","requestId":501,"status":{"applications":[{"appId":"233637DE","transportId":"T1","sessionId":"S1"}]}}"#,
        );
        let bound = run(handshake).unwrap();
        assert_eq!("T1", bound.app.transport_id);
        assert_eq!("S1", bound.app.session_id);
        assert_eq!(&State::Bound(bound.app.clone()), bound.launch.state());
        drop(bound);

        let sent = payloads(outbound);
        assert_eq!(3, sent.len());
        assert_eq!("GET_APP_AVAILABILITY", sent[0].1["type"]);
        assert_eq!(500, sent[0].1["requestId"]);
        assert_eq!(YOUTUBE, sent[0].1["appId"][0]);
        assert_eq!("LAUNCH", sent[1].1["type"]);
        assert_eq!(501, sent[1].1["requestId"]);
        let connect = serde_json::to_value(connection::Request::connect()).unwrap();
        assert_eq!(("T1".to_owned(), connect), sent[2]);
    }

    #[test]
    fn unavailable_app_never_launches() {
        let (handshake, outbound, status) = harness(10);
        push(
            &status,
            r#"{"requestId":10,"availability":{"233637DE":"APP_UNAVAILABLE"}}"#,
        );
        match run(handshake) {
            Err(Error::AppNotAvailable(ref app_id)) if app_id == YOUTUBE => {}
            other => panic!("unexpected result {:?}", other),
        }
        drop(status);
        let sent = payloads(outbound);
        assert_eq!(1, sent.len());
        assert_eq!("GET_APP_AVAILABILITY", sent[0].1["type"]);
    }

    #[test]
    fn silent_receiver_times_out() {
        let (outbound, _outbound_rx) = unbounded();
        let (_status, status_rx) = unbounded::<Status>();
        let open = future::ok((Session::from_outbound(outbound), status_rx));
        let launch = Launch::new(YOUTUBE, RequestIds::default());
        let deadline = Instant::now() + Duration::from_millis(50);
        match run(Handshake::with_deadline(open, launch, deadline)) {
            Err(Error::Timeout) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn closed_connection_fails_the_launch() {
        let (handshake, _outbound, status) = harness(1);
        drop(status);
        match run(handshake) {
            Err(Error::Closed) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn connect_errors_propagate() {
        let open = future::err::<(Session, UnboundedReceiver<Status>), _>(Error::Closed);
        let launch = Launch::new(YOUTUBE, RequestIds::default());
        match run(Handshake::new(open, launch)) {
            Err(Error::Closed) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }
}
