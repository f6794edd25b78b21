//! The media channel loads content into the default media receiver. See the
//! [cast reference docs](https://developers.google.com/cast/docs/reference/messages).

use serde_derive::Serialize;

pub const NAMESPACE: &str = "urn:x-cast:com.google.cast.media";

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    Load {
        request_id: i64,
        session_id: String,
        media: MediaInformation,
        autoplay: bool,
        current_time: f64,
        custom_data: serde_json::Value,
    },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MediaInformation {
    pub content_id: String,
    pub stream_type: StreamType,
    pub content_type: String,
}

#[derive(Serialize, Debug, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamType {
    Live,
}
