//! One cast operation: discover the receiver, launch the app, deliver the
//! command, tear the session down.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use cast_client::launch::{Event as LaunchEvent, Launch, State};
use cast_client::{Bound, Handshake, LaunchedApp, RequestIds, Session, Status};
use futures::future::{self, Either};
use futures::prelude::*;
use futures::sync::mpsc::UnboundedReceiver;

use crate::app::CastApp;
use crate::command::Command;
use crate::config::{Filter, Settings};
use crate::discovery::{self, Browse, Device};
use crate::host::{Emit, Event};
use crate::Error;

pub type Opening =
    Box<dyn Future<Item = (Session, UnboundedReceiver<Status>), Error = cast_client::Error> + Send>;

/// Opens cast sessions.
pub trait Connect {
    fn open(&self, addr: SocketAddr) -> Opening;
}

/// Connects to real receivers over TLS.
#[derive(Debug, Default, Clone, Copy)]
pub struct TlsConnect;

impl Connect for TlsConnect {
    fn open(&self, addr: SocketAddr) -> Opening {
        Box::new(Session::open(addr))
    }
}

/// Everything a cast operation needs besides its command.
#[derive(Clone)]
pub struct Context {
    pub browser: Arc<dyn Browse + Send + Sync>,
    pub connector: Arc<dyn Connect + Send + Sync>,
    pub emitter: Arc<dyn Emit + Send + Sync>,
    pub requests: RequestIds,
    pub settings: Settings,
}

/// A command that reached its receiver app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub device: String,
    pub app: LaunchedApp,
    /// Final launch state, `State::Dispatched` once the payload is queued.
    pub state: State,
}

pub fn cast(
    context: &Context,
    filter: Filter,
    command: Command,
) -> impl Future<Item = Delivered, Error = Error> {
    let app = match CastApp::for_command(&command) {
        Ok(app) => app,
        Err(err) => return Either::A(future::err(err)),
    };
    let emitter = Arc::clone(&context.emitter);
    let connector = Arc::clone(&context.connector);
    let requests = context.requests.clone();
    let settings = context.settings;

    let resolved = discovery::discover(Arc::clone(&context.browser), filter, settings.browse)
        .and_then(move |device| {
            emitter.emit(Event::device_up(&device));
            match device.socket_addr() {
                Some(addr) => Ok((device, addr)),
                None => Err(Error::Discovery(format!(
                    "{} advertised no usable address",
                    device.name
                ))),
            }
        });
    let delivered = resolved.and_then(move |(device, addr)| {
        info!("casting {} to {} at {}", app.app_id(), device.name, addr);
        let launch = Launch::new(app.app_id(), requests);
        let deadline = Instant::now() + settings.launch;
        Handshake::with_deadline(connector.open(addr), launch, deadline)
            .map_err(Error::from)
            .and_then(move |bound| deliver(&app, &command, device, bound))
    });
    Either::B(delivered)
}

fn deliver(
    app: &CastApp,
    command: &Command,
    device: Device,
    bound: Bound,
) -> Result<Delivered, Error> {
    let Bound {
        mut session,
        app: launched,
        mut launch,
        ..
    } = bound;
    let dispatched = app.dispatch(command, &launched, &mut session);
    if dispatched.is_ok() {
        launch.step(LaunchEvent::Dispatched);
    }
    session.shutdown();
    dispatched.map(|_| Delivered {
        device: device.name,
        app: launched,
        state: launch.state().clone(),
    })
}

/// `cast`, with the outcome logged.
pub fn run(
    context: &Context,
    filter: Filter,
    command: Command,
) -> impl Future<Item = (), Error = ()> {
    cast(context, filter, command).then(|outcome| {
        match outcome {
            Ok(delivered) => info!(
                "delivered to {} on {} (transport {})",
                delivered.app.app_id, delivered.device, delivered.app.transport_id
            ),
            Err(err) => warn!("cast failed: {}", err),
        }
        Ok(())
    })
}
