//! Handshake state machine: connect, check availability, launch, bind.
//!
//! The machine performs no I/O. Each inbound event yields at most one
//! `Action` for the caller to carry out. Replies are matched strictly by
//! `requestId`; reordered replies and unrelated broadcasts never advance it.

use std::error;
use std::fmt;

use crate::channel::receiver::{Reply, Request, APP_AVAILABLE};
use crate::RequestIds;

/// The launched receiver application a sender binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedApp {
    pub app_id: String,
    pub transport_id: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    AppNotAvailable(String),
    LaunchFailed(Option<String>),
    Timeout,
    Disconnected,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Failure::AppNotAvailable(ref app_id) => {
                write!(f, "Receiver application {} is not available", app_id)
            }
            Failure::LaunchFailed(Some(ref reason)) => write!(f, "Launch failed: {}", reason),
            Failure::LaunchFailed(None) => write!(f, "Launch failed"),
            Failure::Timeout => write!(f, "Timed out waiting for the receiver"),
            Failure::Disconnected => write!(f, "Connection closed during launch"),
        }
    }
}

impl error::Error for Failure {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Idle,
    Connecting,
    AwaitingAvailability { request_id: i64 },
    Launching { request_id: i64 },
    Bound(LaunchedApp),
    Dispatched,
    Failed(Failure),
}

impl State {
    pub fn is_terminal(&self) -> bool {
        match *self {
            State::Bound(_) | State::Dispatched | State::Failed(_) => true,
            _ => false,
        }
    }
}

#[derive(Debug)]
pub enum Event<'a> {
    /// The underlying connection is being opened.
    Open,
    /// The virtual connection to the receiver is established.
    Connected,
    Reply(&'a Reply),
    /// The launch deadline passed.
    Elapsed,
    /// The receiver closed the connection.
    Closed,
    /// The application payload was handed to the transport.
    Dispatched,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send this request on the receiver-control channel.
    Send(Request),
    /// Open the dynamic channels to the launched application.
    Bind(LaunchedApp),
    Fail(Failure),
}

#[derive(Debug, Clone)]
pub struct Launch {
    app_id: String,
    requests: RequestIds,
    state: State,
}

impl Launch {
    pub fn new(app_id: &str, requests: RequestIds) -> Self {
        Self {
            app_id: app_id.to_owned(),
            requests,
            state: State::Idle,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn step(&mut self, event: Event) -> Option<Action> {
        let state = std::mem::replace(&mut self.state, State::Idle);
        let (next, action) = self.transition(state, event);
        if let Some(ref action) = action {
            trace!("launch of {} -> {:?} ({:?})", self.app_id, next, action);
        }
        self.state = next;
        action
    }

    fn transition(&self, state: State, event: Event) -> (State, Option<Action>) {
        match (state, event) {
            (State::Idle, Event::Open) => (State::Connecting, None),
            (State::Connecting, Event::Connected) => {
                let request_id = self.requests.next_id();
                debug!("checking availability of {} ({})", self.app_id, request_id);
                let request = Request::GetAppAvailability {
                    request_id,
                    app_id: vec![self.app_id.clone()],
                };
                (
                    State::AwaitingAvailability { request_id },
                    Some(Action::Send(request)),
                )
            }
            (State::AwaitingAvailability { request_id }, Event::Reply(reply))
                if reply.request_id() == request_id =>
            {
                self.on_availability(request_id, reply)
            }
            (State::Launching { request_id }, Event::Reply(reply))
                if reply.request_id() == request_id =>
            {
                self.on_launch(request_id, reply)
            }
            (State::Bound(_), Event::Dispatched) => (State::Dispatched, None),
            (ref state, Event::Elapsed) if !state.is_terminal() => {
                warn!("launch of {} timed out in {:?}", self.app_id, state);
                fail(Failure::Timeout)
            }
            (ref state, Event::Closed) if !state.is_terminal() => fail(Failure::Disconnected),
            (state, event) => {
                trace!("launch of {} ignored {:?} in {:?}", self.app_id, event, state);
                (state, None)
            }
        }
    }

    fn on_availability(&self, request_id: i64, reply: &Reply) -> (State, Option<Action>) {
        match *reply {
            Reply::Availability {
                ref availability, ..
            } => {
                let available = availability
                    .get(&self.app_id)
                    .map_or(false, |value| value == APP_AVAILABLE);
                if !available {
                    return fail(Failure::AppNotAvailable(self.app_id.clone()));
                }
                let request_id = self.requests.next_id();
                debug!("launching {} ({})", self.app_id, request_id);
                let request = Request::Launch {
                    request_id,
                    app_id: self.app_id.clone(),
                };
                (State::Launching { request_id }, Some(Action::Send(request)))
            }
            Reply::LaunchError { ref reason, .. } => fail(Failure::LaunchFailed(reason.clone())),
            Reply::ReceiverStatus { .. } => (State::AwaitingAvailability { request_id }, None),
        }
    }

    fn on_launch(&self, request_id: i64, reply: &Reply) -> (State, Option<Action>) {
        match *reply {
            Reply::ReceiverStatus { ref status, .. } => {
                let app = status
                    .applications
                    .iter()
                    .find(|app| app.app_id == self.app_id);
                match app {
                    Some(app) => {
                        let launched = LaunchedApp {
                            app_id: app.app_id.clone(),
                            transport_id: app.transport_id.clone(),
                            session_id: app.session_id.clone(),
                        };
                        (
                            State::Bound(launched.clone()),
                            Some(Action::Bind(launched)),
                        )
                    }
                    None => {
                        // The receiver may report status before the new
                        // application has attached.
                        debug!("{} not running yet, still launching", self.app_id);
                        (State::Launching { request_id }, None)
                    }
                }
            }
            Reply::LaunchError { ref reason, .. } => fail(Failure::LaunchFailed(reason.clone())),
            Reply::Availability { .. } => (State::Launching { request_id }, None),
        }
    }
}

fn fail(failure: Failure) -> (State, Option<Action>) {
    (State::Failed(failure.clone()), Some(Action::Fail(failure)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const YOUTUBE: &str = "233637DE";

    fn reply(json: &str) -> Reply {
        Reply::parse(json).unwrap().unwrap()
    }

    fn availability(request_id: i64, value: &str) -> Reply {
        reply(&format!(
            r#"{{"requestId":{},"availability":{{"{}":"{}"}}}}"#,
            request_id, YOUTUBE, value
        ))
    }

    fn launched(request_id: i64, app_id: &str, transport_id: &str) -> Reply {
        reply(&format!(
            r#"{{"type":"RECEIVER_STATUS","requestId":{},"status":{{"applications":[{{"appId":"{}","transportId":"{}","sessionId":"S1"}}]}}}}"#,
            request_id, app_id, transport_id
        ))
    }

    fn sent_id(action: Option<Action>) -> i64 {
        match action {
            Some(Action::Send(request)) => request.request_id(),
            other => panic!("expected a send action, got {:?}", other),
        }
    }

    fn connected(requests: RequestIds) -> (Launch, i64) {
        let mut launch = Launch::new(YOUTUBE, requests);
        assert_eq!(None, launch.step(Event::Open));
        assert_eq!(&State::Connecting, launch.state());
        let id = sent_id(launch.step(Event::Connected));
        (launch, id)
    }

    #[test]
    fn happy_path_binds_to_launched_transport() {
        let (mut launch, availability_id) = connected(RequestIds::default());
        assert_eq!(1443, availability_id);
        let launch_id = sent_id(launch.step(Event::Reply(&availability(
            availability_id,
            APP_AVAILABLE,
        ))));
        assert!(availability_id < launch_id);
        assert_eq!(&State::Launching { request_id: launch_id }, launch.state());

        let action = launch.step(Event::Reply(&launched(launch_id, YOUTUBE, "T1")));
        let app = LaunchedApp {
            app_id: YOUTUBE.to_owned(),
            transport_id: "T1".to_owned(),
            session_id: "S1".to_owned(),
        };
        assert_eq!(Some(Action::Bind(app.clone())), action);
        assert_eq!(&State::Bound(app), launch.state());
        assert_eq!(None, launch.step(Event::Dispatched));
        assert_eq!(&State::Dispatched, launch.state());
    }

    #[test]
    fn unavailable_app_fails_without_launching() {
        let (mut launch, id) = connected(RequestIds::default());
        let action = launch.step(Event::Reply(&availability(id, "APP_UNAVAILABLE")));
        let failure = Failure::AppNotAvailable(YOUTUBE.to_owned());
        assert_eq!(Some(Action::Fail(failure.clone())), action);
        assert_eq!(&State::Failed(failure), launch.state());
    }

    #[test]
    fn missing_availability_entry_counts_as_unavailable() {
        let (mut launch, id) = connected(RequestIds::default());
        let empty = reply(&format!(r#"{{"requestId":{},"availability":{{}}}}"#, id));
        match launch.step(Event::Reply(&empty)) {
            Some(Action::Fail(Failure::AppNotAvailable(_))) => {}
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn launch_reply_without_the_app_keeps_launching() {
        let (mut launch, id) = connected(RequestIds::default());
        let launch_id = sent_id(launch.step(Event::Reply(&availability(id, APP_AVAILABLE))));
        let other_app = launched(launch_id, "CC1AD845", "T9");
        assert_eq!(None, launch.step(Event::Reply(&other_app)));
        assert_eq!(&State::Launching { request_id: launch_id }, launch.state());

        match launch.step(Event::Reply(&launched(launch_id, YOUTUBE, "T2"))) {
            Some(Action::Bind(app)) => assert_eq!("T2", app.transport_id),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn unrelated_request_ids_are_ignored() {
        let (mut launch, id) = connected(RequestIds::default());
        let broadcast = launched(0, YOUTUBE, "T1");
        assert_eq!(None, launch.step(Event::Reply(&broadcast)));
        assert_eq!(None, launch.step(Event::Reply(&availability(id + 100, APP_AVAILABLE))));
        assert_eq!(&State::AwaitingAvailability { request_id: id }, launch.state());

        let launch_id = sent_id(launch.step(Event::Reply(&availability(id, APP_AVAILABLE))));
        // A late duplicate of the availability answer no longer matches.
        assert_eq!(None, launch.step(Event::Reply(&availability(id, APP_AVAILABLE))));
        assert_eq!(&State::Launching { request_id: launch_id }, launch.state());
    }

    #[test]
    fn launch_error_fails_the_handshake() {
        let (mut launch, id) = connected(RequestIds::default());
        let launch_id = sent_id(launch.step(Event::Reply(&availability(id, APP_AVAILABLE))));
        let error = reply(&format!(
            r#"{{"type":"LAUNCH_ERROR","requestId":{},"reason":"NOT_ALLOWED"}}"#,
            launch_id
        ));
        assert_eq!(
            Some(Action::Fail(Failure::LaunchFailed(Some("NOT_ALLOWED".to_owned())))),
            launch.step(Event::Reply(&error))
        );
    }

    #[test]
    fn deadline_fails_pending_handshakes_only() {
        let (mut launch, _) = connected(RequestIds::default());
        assert_eq!(
            Some(Action::Fail(Failure::Timeout)),
            launch.step(Event::Elapsed)
        );
        assert_eq!(&State::Failed(Failure::Timeout), launch.state());
        // Terminal states absorb later events.
        assert_eq!(None, launch.step(Event::Elapsed));
        assert_eq!(None, launch.step(Event::Closed));
    }

    #[test]
    fn sessions_sharing_a_sequence_draw_disjoint_ids() {
        let requests = RequestIds::default();
        let (mut first, first_id) = connected(requests.clone());
        let (mut second, second_id) = connected(requests);
        assert_ne!(first_id, second_id);
        let first_launch = sent_id(first.step(Event::Reply(&availability(first_id, APP_AVAILABLE))));
        let second_launch =
            sent_id(second.step(Event::Reply(&availability(second_id, APP_AVAILABLE))));
        assert!(first_id < first_launch);
        assert!(second_id < second_launch);
        assert_ne!(first_launch, second_launch);
        // Replies for the other session never cross over.
        assert_eq!(None, first.step(Event::Reply(&launched(second_launch, YOUTUBE, "T1"))));
    }
}
