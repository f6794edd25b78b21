//! Receiver applications a command can be cast to, and the payload each one
//! expects on its namespace.

use cast_client::channel::media::{self, MediaInformation, StreamType};
use cast_client::channel::DYNAMIC_SENDER_ID;
use cast_client::{Encoding, LaunchedApp, Session};
use serde_derive::Serialize;
use serde_json::json;

use crate::command::{CastingApplication, Command};
use crate::{youtube, Error};

pub const YOUTUBE_APP_ID: &str = "233637DE";
pub const YOUTUBE_NAMESPACE: &str = "urn:x-cast:com.google.youtube.mdx";
pub const DISPLAY_TEXT_APP_ID: &str = "794B7BBF";
pub const DISPLAY_TEXT_NAMESPACE: &str = "urn:x-cast:com.google.cast.sample.helloworld";
pub const URL_APP_ID: &str = "7897BA3B";
pub const URL_NAMESPACE: &str = "urn:x-cast:uk.co.splintered.urlcaster";
pub const MEDIA_APP_ID: &str = "CC1AD845";

/// Fixed correlation id of media `LOAD` requests.
const MEDIA_LOAD_REQUEST_ID: i64 = 77_063_063;
const MEDIA_CONTENT_TYPE: &str = "video/mp4";
const MEDIA_TITLE: &str = "Triggered from cast-trigger";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastApp {
    Youtube,
    DisplayText,
    Url,
    Media,
    Custom { app_id: String, namespace: String },
}

/// A message body ready for a dynamic channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
}

impl Payload {
    fn encoding(&self) -> Encoding {
        match *self {
            Payload::Json(_) => Encoding::Json,
            Payload::Text(_) => Encoding::Text,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(tag = "type")]
enum MdxRequest {
    #[serde(rename = "flingVideo")]
    FlingVideo { data: FlingVideo },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct FlingVideo {
    current_time: u32,
    video_id: String,
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, Error> {
    field
        .as_ref()
        .map(String::as_str)
        .ok_or(Error::MissingField(name))
}

fn to_json<T: serde::Serialize>(request: &T) -> Result<Payload, Error> {
    serde_json::to_value(request)
        .map(Payload::Json)
        .map_err(|err| Error::Channel(cast_client::channel::Error::Serialize(err)))
}

impl CastApp {
    /// Custom apps take their id and namespace from the command.
    pub fn for_command(command: &Command) -> Result<Self, Error> {
        let app = match command.casting_application {
            CastingApplication::Youtube => CastApp::Youtube,
            CastingApplication::DisplayText => CastApp::DisplayText,
            CastingApplication::Url => CastApp::Url,
            CastingApplication::Media => CastApp::Media,
            CastingApplication::CustomApp => CastApp::Custom {
                app_id: required(&command.app_id, "appId")?.to_owned(),
                namespace: required(&command.namespace, "namespace")?.to_owned(),
            },
        };
        Ok(app)
    }

    pub fn app_id(&self) -> &str {
        match *self {
            CastApp::Youtube => YOUTUBE_APP_ID,
            CastApp::DisplayText => DISPLAY_TEXT_APP_ID,
            CastApp::Url => URL_APP_ID,
            CastApp::Media => MEDIA_APP_ID,
            CastApp::Custom { ref app_id, .. } => app_id,
        }
    }

    pub fn namespace(&self) -> &str {
        match *self {
            CastApp::Youtube => YOUTUBE_NAMESPACE,
            CastApp::DisplayText => DISPLAY_TEXT_NAMESPACE,
            CastApp::Url => URL_NAMESPACE,
            CastApp::Media => media::NAMESPACE,
            CastApp::Custom { ref namespace, .. } => namespace,
        }
    }

    /// Build the message for `command`, checking its required field.
    pub fn payload(&self, command: &Command, launched: &LaunchedApp) -> Result<Payload, Error> {
        match *self {
            CastApp::Youtube => {
                let link = required(&command.youtube_url, "youtubeUrl")?;
                let video_id =
                    youtube::video_id(link).ok_or_else(|| Error::InvalidVideoUrl(link.to_owned()))?;
                to_json(&MdxRequest::FlingVideo {
                    data: FlingVideo {
                        current_time: 0,
                        video_id,
                    },
                })
            }
            CastApp::DisplayText => {
                let message = required(&command.message, "message")?;
                Ok(Payload::Text(message.to_owned()))
            }
            CastApp::Url => {
                let url = required(&command.url, "url")
                    .or_else(|_| required(&command.meeting_id, "url"))?;
                Ok(Payload::Text(url.to_owned()))
            }
            CastApp::Media => {
                let media_url = required(&command.media_url, "mediaUrl")?;
                to_json(&media::Request::Load {
                    request_id: MEDIA_LOAD_REQUEST_ID,
                    session_id: launched.session_id.clone(),
                    media: MediaInformation {
                        content_id: media_url.to_owned(),
                        stream_type: StreamType::Live,
                        content_type: MEDIA_CONTENT_TYPE.to_owned(),
                    },
                    autoplay: true,
                    current_time: 0.0,
                    custom_data: json!({ "payload": { "title": MEDIA_TITLE } }),
                })
            }
            CastApp::Custom { .. } => Err(Error::Unimplemented("customApp payload dispatch")),
        }
    }

    /// Send the command to the launched app on its namespace. Nothing is sent
    /// when the payload cannot be built.
    pub fn dispatch(
        &self,
        command: &Command,
        launched: &LaunchedApp,
        session: &mut Session,
    ) -> Result<(), Error> {
        let payload = self.payload(command, launched)?;
        let channel = session.create_dynamic_channel(
            DYNAMIC_SENDER_ID,
            &launched.transport_id,
            self.namespace(),
            payload.encoding(),
        );
        debug!("dispatching to {} on {}", launched.app_id, self.namespace());
        match payload {
            Payload::Json(ref body) => channel.send(body)?,
            Payload::Text(ref body) => channel.send_text(body)?,
        }
        Ok(())
    }
}
