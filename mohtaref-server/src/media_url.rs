//! Stored media value -> URL the site can fetch.

/// Which streaming route serves a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Values that already look like URLs (`http...` or `/...`) pass through;
/// anything else is an object id and is mapped onto its streaming route.
pub fn media_url(value: &str, kind: MediaKind) -> String {
    if value.starts_with("http") || value.starts_with('/') {
        return value.to_string();
    }
    match kind {
        MediaKind::Image => format!("/api/images/{value}"),
        MediaKind::Video => format!("/api/videos/stream/{value}"),
    }
}

pub fn image_url(value: &str) -> String {
    media_url(value, MediaKind::Image)
}

pub fn video_url(value: &str) -> String {
    media_url(value, MediaKind::Video)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_map_to_streaming_routes() {
        assert_eq!(image_url("6553a1f0c2b4e81a9f0d1234"), "/api/images/6553a1f0c2b4e81a9f0d1234");
        assert_eq!(video_url("abc"), "/api/videos/stream/abc");
    }

    #[test]
    fn urls_pass_through() {
        assert_eq!(image_url("https://cdn.example.com/x.webp"), "https://cdn.example.com/x.webp");
        assert_eq!(video_url("/almohtaref/clip.mp4"), "/almohtaref/clip.mp4");
    }
}
