use serde_derive::Deserialize;

/// Which receiver application a command targets.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastingApplication {
    #[serde(rename = "youtube", alias = "Youtube", alias = "YouTube")]
    Youtube,
    #[serde(rename = "displayText", alias = "DisplayText")]
    DisplayText,
    #[serde(rename = "url", alias = "Url")]
    Url,
    #[serde(rename = "media", alias = "Media")]
    Media,
    #[serde(rename = "customApp", alias = "CustomApp")]
    CustomApp,
}

/// One inbound cast request.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    #[serde(alias = "CastingApplication")]
    pub casting_application: CastingApplication,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default, alias = "Message")]
    pub message: Option<String>,
    #[serde(default, alias = "Url")]
    pub url: Option<String>,
    #[serde(default, alias = "MeetingID")]
    pub meeting_id: Option<String>,
    #[serde(default, alias = "MediaURL", alias = "mediaURL")]
    pub media_url: Option<String>,
    #[serde(default, alias = "AppID", alias = "appID")]
    pub app_id: Option<String>,
    #[serde(default, alias = "urn")]
    pub namespace: Option<String>,
}

impl Command {
    /// Parse a host payload. Malformed payloads yield `None`.
    pub fn from_payload(payload: serde_json::Value) -> Option<Self> {
        match serde_json::from_value(payload) {
            Ok(command) => Some(command),
            Err(err) => {
                debug!("ignoring malformed command: {}", err);
                None
            }
        }
    }
}
