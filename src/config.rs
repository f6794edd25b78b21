//! Plugin configuration as delivered by the host, and the discovery filter
//! derived from it.

use std::time::Duration;

use serde_derive::Deserialize;

/// Quiet window that coalesces a burst of commands into one cast.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);
/// How long one discovery pass browses for a matching device.
pub const BROWSE_WINDOW: Duration = Duration::from_secs(10);

/// Options object from a host `config` message.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    #[serde(default, alias = "AutoDiscovery")]
    pub auto_discovery: bool,
    #[serde(default, alias = "ChromecastName")]
    pub chromecast_name: Option<String>,
}

/// Decides which advertised device a cast operation targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub auto_discovery: bool,
    pub target_name: Option<String>,
}

impl Filter {
    /// `false` when no device could ever match.
    pub fn has_criteria(&self) -> bool {
        self.auto_discovery || self.target_name.is_some()
    }

    pub fn matches(&self, name: &str) -> bool {
        if let Some(ref target) = self.target_name {
            if target.to_lowercase() == name.to_lowercase() {
                return true;
            }
        }
        self.auto_discovery
    }
}

impl From<Options> for Filter {
    fn from(options: Options) -> Self {
        let target_name = options.chromecast_name.filter(|name| !name.is_empty());
        Self {
            auto_discovery: options.auto_discovery,
            target_name,
        }
    }
}

/// Timing knobs for the command pump and each cast operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub debounce: Duration,
    pub browse: Duration,
    pub launch: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE_WINDOW,
            browse: BROWSE_WINDOW,
            launch: cast_client::LAUNCH_DEADLINE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned(name: &str) -> Filter {
        Filter {
            auto_discovery: false,
            target_name: Some(name.to_owned()),
        }
    }

    #[test]
    fn pinned_name_matches_case_insensitively() {
        let filter = pinned("Living Room TV");
        assert!(filter.matches("living room tv"));
        assert!(filter.matches("LIVING ROOM TV"));
        assert!(!filter.matches("Kitchen"));
        assert!(!filter.matches("Living Room TV 2"));
    }

    #[test]
    fn auto_discovery_matches_any_name() {
        let filter = Filter {
            auto_discovery: true,
            target_name: None,
        };
        assert!(filter.has_criteria());
        assert!(filter.matches("Kitchen"));
        assert!(filter.matches(""));
    }

    #[test]
    fn no_criteria_never_matches() {
        let filter = Filter::default();
        assert!(!filter.has_criteria());
        assert!(!filter.matches("Kitchen"));
    }

    #[test]
    fn options_accept_both_spellings() {
        let options: Options =
            serde_json::from_str(r#"{"AutoDiscovery":true,"ChromecastName":"Den"}"#).unwrap();
        let camel: Options =
            serde_json::from_str(r#"{"autoDiscovery":true,"chromecastName":"Den"}"#).unwrap();
        assert_eq!(options, camel);
        let filter = Filter::from(options);
        assert!(filter.auto_discovery);
        assert_eq!(Some("Den".to_owned()), filter.target_name);
    }

    #[test]
    fn empty_name_is_no_name() {
        let options: Options = serde_json::from_str(r#"{"chromecastName":""}"#).unwrap();
        assert!(!Filter::from(options).has_criteria());
        let empty: Options = serde_json::from_str("{}").unwrap();
        assert_eq!(Filter::default(), Filter::from(empty));
    }

    #[test]
    fn configured_name_is_kept_verbatim() {
        let options: Options = serde_json::from_str(r#"{"chromecastName":" Den "}"#).unwrap();
        let filter = Filter::from(options);
        assert_eq!(Some(" Den ".to_owned()), filter.target_name);
        assert!(!filter.matches("Den"));
        assert!(filter.matches(" den "));
    }
}
