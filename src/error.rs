use std::error;
use std::fmt;
use std::io;

use cast_client::channel;

/// Why a cast operation ended without delivering its command.
#[derive(Debug)]
pub enum Error {
    /// Auto discovery is off and no target name is configured.
    NoDiscoveryCriteria,
    /// Browsing ended without a matching device.
    DeviceNotFound,
    Discovery(String),
    Connection(io::Error),
    /// The receiver closed the connection mid-operation.
    Closed,
    AppNotAvailable(String),
    LaunchFailed(Option<String>),
    MissingField(&'static str),
    InvalidVideoUrl(String),
    Timeout,
    Unimplemented(&'static str),
    Channel(channel::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::NoDiscoveryCriteria => {
                write!(f, "Auto discovery is off and no chromecast name is set")
            }
            Error::DeviceNotFound => write!(f, "No matching chromecast found"),
            Error::Discovery(ref err) => write!(f, "Discovery error: {}", err),
            Error::Connection(ref err) => write!(f, "Connection error: {}", err),
            Error::Closed => write!(f, "Receiver closed the connection"),
            Error::AppNotAvailable(ref app_id) => {
                write!(f, "Receiver application {} is not available", app_id)
            }
            Error::LaunchFailed(Some(ref reason)) => write!(f, "Launch failed: {}", reason),
            Error::LaunchFailed(None) => write!(f, "Launch failed"),
            Error::MissingField(field) => write!(f, "Command is missing field {}", field),
            Error::InvalidVideoUrl(ref url) => write!(f, "No video id in {}", url),
            Error::Timeout => write!(f, "Timed out waiting for the receiver"),
            Error::Unimplemented(what) => write!(f, "Not implemented: {}", what),
            Error::Channel(ref err) => write!(f, "Channel error: {}", err),
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

impl From<cast_client::Error> for Error {
    fn from(err: cast_client::Error) -> Self {
        match err {
            cast_client::Error::Connection(err) => Error::Connection(err),
            cast_client::Error::Closed => Error::Closed,
            cast_client::Error::Channel(err) => Error::Channel(err),
            cast_client::Error::AppNotAvailable(app_id) => Error::AppNotAvailable(app_id),
            cast_client::Error::LaunchFailed(reason) => Error::LaunchFailed(reason),
            cast_client::Error::Timeout => Error::Timeout,
        }
    }
}

impl From<channel::Error> for Error {
    fn from(err: channel::Error) -> Self {
        Error::Channel(err)
    }
}
