use serde::{Deserialize, Serialize};

/// Confidence tag assigned to a discovered URL by the classifier.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamCategory {
    /// A progressive file such as `.mp4` or `.webm`.
    DirectFile,
    /// An HLS manifest (`.m3u8`).
    SegmentedPlaylist,
    /// Another page rather than a terminal media resource.
    NavigationLink,
    Unknown,
}

impl StreamCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamCategory::DirectFile => "direct-file",
            StreamCategory::SegmentedPlaylist => "segmented-playlist",
            StreamCategory::NavigationLink => "navigation-link",
            StreamCategory::Unknown => "unknown",
        }
    }

    /// Whether descriptors of this category may be returned to the caller.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamCategory::DirectFile | StreamCategory::SegmentedPlaylist
        )
    }
}

/// Media file extensions recognised anywhere in page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaExtension {
    Mp4,
    Webm,
    M3u8,
    Ts,
}

impl MediaExtension {
    pub const ALL: [MediaExtension; 4] = [
        MediaExtension::Mp4,
        MediaExtension::Webm,
        MediaExtension::M3u8,
        MediaExtension::Ts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaExtension::Mp4 => ".mp4",
            MediaExtension::Webm => ".webm",
            MediaExtension::M3u8 => ".m3u8",
            MediaExtension::Ts => ".ts",
        }
    }

    /// Returns the extension the URL's path ends with, ignoring query and fragment.
    ///
    /// Works on relative and absolute URLs alike.
    pub fn from_url(url: &str) -> Option<Self> {
        let end = url.find(['?', '#']).unwrap_or(url.len());
        let path = url[..end].to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ext| path.ends_with(ext.as_str()))
    }

    /// Human readable container name used in server labels.
    pub fn label(&self) -> &'static str {
        match self {
            MediaExtension::Mp4 => "MP4",
            MediaExtension::Webm => "WEBM",
            MediaExtension::M3u8 => "HLS",
            MediaExtension::Ts => "TS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_ignores_query_and_case() {
        assert_eq!(
            MediaExtension::from_url("https://cdn.example/A.MP4?token=1#t=3"),
            Some(MediaExtension::Mp4)
        );
        assert_eq!(
            MediaExtension::from_url("/hls/master.m3u8"),
            Some(MediaExtension::M3u8)
        );
        assert_eq!(MediaExtension::from_url("https://cdn.example/a.mp4.html"), None);
        assert_eq!(MediaExtension::from_url("https://cdn.example/watch?file=a.mp4"), None);
    }

    #[test]
    fn only_files_and_playlists_are_terminal() {
        assert!(StreamCategory::DirectFile.is_terminal());
        assert!(StreamCategory::SegmentedPlaylist.is_terminal());
        assert!(!StreamCategory::NavigationLink.is_terminal());
        assert!(!StreamCategory::Unknown.is_terminal());
    }
}
