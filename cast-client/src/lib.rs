#[macro_use]
extern crate log;

use std::error;
use std::fmt;
use std::io;
use std::net::SocketAddr;

use futures::future;
use futures::prelude::*;
use tokio_tcp::TcpStream;
use tokio_tls::{TlsConnector, TlsStream};

pub mod channel;
mod codec;
mod handshake;
pub mod launch;
#[allow(clippy::all, clippy::pedantic)]
mod proto;
mod request;
mod session;
mod worker;

pub use self::channel::receiver::Reply;
pub use self::channel::{Channel, Encoding};
pub use self::handshake::{Bound, Handshake, LAUNCH_DEADLINE};
pub use self::launch::{Failure, LaunchedApp};
pub use self::proto::CastMessage;
pub use self::request::{RequestIds, REQUEST_ID_SEED};
pub use self::session::Session;

/// Events surfaced from a session's read loop.
#[derive(Debug)]
pub enum Status {
    /// The receiver closed the connection.
    Closed,
    /// A receiver-control reply or broadcast.
    Receiver(Box<Reply>),
    /// A message on a namespace no system channel owns.
    Message(Box<Inbound>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub source: String,
    pub destination: String,
    pub namespace: String,
    pub payload: String,
}

#[derive(Debug)]
pub enum Error {
    Connection(io::Error),
    Closed,
    Channel(channel::Error),
    AppNotAvailable(String),
    LaunchFailed(Option<String>),
    Timeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Connection(ref err) => write!(f, "Cast connection error: {}", err),
            Error::Closed => write!(f, "Cast connection closed"),
            Error::Channel(ref err) => write!(f, "Cast channel error: {}", err),
            Error::AppNotAvailable(ref app_id) => {
                write!(f, "Receiver application {} is not available", app_id)
            }
            Error::LaunchFailed(Some(ref reason)) => write!(f, "Launch failed: {}", reason),
            Error::LaunchFailed(None) => write!(f, "Launch failed"),
            Error::Timeout => write!(f, "Timed out waiting for the receiver"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Connection(ref err) => Some(err),
            Error::Channel(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Connection(err)
    }
}

impl From<channel::Error> for Error {
    fn from(err: channel::Error) -> Self {
        Error::Channel(err)
    }
}

impl From<Failure> for Error {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::AppNotAvailable(app_id) => Error::AppNotAvailable(app_id),
            Failure::LaunchFailed(reason) => Error::LaunchFailed(reason),
            Failure::Timeout => Error::Timeout,
            Failure::Disconnected => Error::Closed,
        }
    }
}

/// Asynchronously establish a TLS connection. Receivers present self-signed
/// certificates, so neither the chain nor the hostname is verified.
fn tls_connect(addr: SocketAddr) -> impl Future<Item = TlsStream<TcpStream>, Error = io::Error> {
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_hostnames(true)
        .danger_accept_invalid_certs(true)
        .build()
        .map(TlsConnector::from)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
    let connector = match connector {
        Ok(connector) => connector,
        Err(err) => return future::Either::A(future::err(err)),
    };
    let connect = TcpStream::connect(&addr).and_then(move |socket| {
        info!("Establishing TLS connection to {:?}", addr);
        connector
            .connect(&addr.ip().to_string(), socket)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    });
    future::Either::B(connect)
}
