//! Extract a video id from the many shapes of YouTube links.

use url::Url;

fn is_video_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_youtube_host(host: &str) -> bool {
    host == "youtube.com"
        || host.ends_with(".youtube.com")
        || host == "youtube-nocookie.com"
        || host.ends_with(".youtube-nocookie.com")
}

/// Returns the video id in `link`, which may also be a bare id.
pub fn video_id(link: &str) -> Option<String> {
    let link = link.trim();
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(_) if is_video_id(link) => return Some(link.to_owned()),
        Err(_) if link.contains("youtu") => Url::parse(&format!("https://{}", link)).ok()?,
        Err(_) => return None,
    };
    let host = url.host_str()?.to_lowercase();
    let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
    let id = if host == "youtu.be" {
        segments.next().map(str::to_owned)
    } else if is_youtube_host(&host) {
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed") | Some("v") | Some("shorts") | Some("live") => {
                segments.next().map(str::to_owned)
            }
            _ => None,
        }
    } else {
        None
    };
    id.filter(|id| is_video_id(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_links() {
        assert_eq!(
            Some("abc123".to_owned()),
            video_id("https://youtube.com/watch?v=abc123")
        );
        assert_eq!(
            Some("0vxOhd4qlnA".to_owned()),
            video_id("https://www.youtube.com/watch?feature=share&v=0vxOhd4qlnA&t=10")
        );
        assert_eq!(
            Some("0vxOhd4qlnA".to_owned()),
            video_id("https://m.youtube.com/watch?v=0vxOhd4qlnA")
        );
    }

    #[test]
    fn short_and_path_links() {
        assert_eq!(Some("0vxOhd4qlnA".to_owned()), video_id("https://youtu.be/0vxOhd4qlnA"));
        assert_eq!(Some("0vxOhd4qlnA".to_owned()), video_id("youtu.be/0vxOhd4qlnA"));
        assert_eq!(
            Some("0vxOhd4qlnA".to_owned()),
            video_id("https://www.youtube.com/embed/0vxOhd4qlnA?autoplay=1")
        );
        assert_eq!(
            Some("0vxOhd4qlnA".to_owned()),
            video_id("https://www.youtube.com/shorts/0vxOhd4qlnA")
        );
        assert_eq!(Some("0vxOhd4qlnA".to_owned()), video_id("https://youtube.com/v/0vxOhd4qlnA"));
    }

    #[test]
    fn bare_ids() {
        assert_eq!(Some("0vxOhd4qlnA".to_owned()), video_id("0vxOhd4qlnA"));
        assert_eq!(Some("a-b_c".to_owned()), video_id(" a-b_c "));
    }

    #[test]
    fn links_without_ids() {
        assert_eq!(None, video_id(""));
        assert_eq!(None, video_id("https://youtube.com/watch"));
        assert_eq!(None, video_id("https://youtube.com/feed/trending"));
        assert_eq!(None, video_id("https://example.com/watch?v=abc123"));
        assert_eq!(None, video_id("not a link"));
    }
}
