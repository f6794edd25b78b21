//! The receiver channel manages global receiver state: application
//! availability, launching applications and reporting running sessions.

use std::collections::HashMap;

use futures::sync::mpsc::UnboundedSender;
use serde_derive::{Deserialize, Serialize};

use crate::channel::{self, Error};
use crate::proto::CastMessage;
use crate::Status as SessionStatus;

const CHANNEL: &str = "receiver";
pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.receiver";
/// Availability value reported for installed receiver applications.
pub const APP_AVAILABLE: &str = "APP_AVAILABLE";

#[derive(Debug)]
pub struct Handler {
    status: UnboundedSender<SessionStatus>,
}

impl Handler {
    pub fn new(status: UnboundedSender<SessionStatus>) -> Self {
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

    fn handle(&self, _: &CastMessage, payload: Self::Payload) -> Result<(), Error> {
        let reply = match payload.into_reply() {
            Some(reply) => reply,
            None => {
                trace!("ignoring receiver message without a known shape");
                return Ok(());
            }
        };
        trace!("receiver reply for request {}", reply.request_id());
        self.status
            .unbounded_send(SessionStatus::Receiver(Box::new(reply)))
            .map_err(|_| Error::StatusSend)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    GetAppAvailability {
        request_id: i64,
        app_id: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Launch { request_id: i64, app_id: String },
}

impl Request {
    pub fn request_id(&self) -> i64 {
        match *self {
            Request::GetAppAvailability { request_id, .. } | Request::Launch { request_id, .. } => {
                request_id
            }
        }
    }
}

/// Wire shape of everything the receiver sends. Availability replies carry no
/// `type`, so the payload is decoded field by field and then classified.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    request_id: i64,
    #[serde(default)]
    availability: Option<HashMap<String, String>>,
    #[serde(default)]
    status: Option<Status>,
    #[serde(default)]
    reason: Option<String>,
}

impl Response {
    pub fn into_reply(self) -> Option<Reply> {
        let request_id = self.request_id;
        if let Some(availability) = self.availability {
            return Some(Reply::Availability {
                request_id,
                availability,
            });
        }
        match (self.kind.as_ref().map(String::as_str), self.status) {
            (Some("LAUNCH_ERROR"), _) | (Some("INVALID_REQUEST"), _) => Some(Reply::LaunchError {
                request_id,
                reason: self.reason,
            }),
            (Some("RECEIVER_STATUS"), Some(status)) | (None, Some(status)) => {
                Some(Reply::ReceiverStatus { request_id, status })
            }
            _ => None,
        }
    }
}

/// A classified receiver reply. `request_id` is `0` for spontaneous
/// broadcasts.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Availability {
        request_id: i64,
        availability: HashMap<String, String>,
    },
    ReceiverStatus {
        request_id: i64,
        status: Status,
    },
    LaunchError {
        request_id: i64,
        reason: Option<String>,
    },
}

impl Reply {
    pub fn request_id(&self) -> i64 {
        match *self {
            Reply::Availability { request_id, .. }
            | Reply::ReceiverStatus { request_id, .. }
            | Reply::LaunchError { request_id, .. } => request_id,
        }
    }

    pub fn parse(payload: &str) -> Result<Option<Self>, Error> {
        let response = serde_json::from_str::<Response>(payload).map_err(Error::Parse)?;
        Ok(response.into_reply())
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default)]
    pub applications: Vec<Application>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub app_id: String,
    #[serde(default)]
    pub session_id: String,
    pub transport_id: String,
}
