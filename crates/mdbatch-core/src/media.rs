//! Media type lookup
//!
//! Resolution order for a file path or URL:
//!
//! 1. a media type forced by configuration
//! 2. remote video hosts
//! 3. extensions listed in configuration
//! 4. the built-in extension table
//! 5. [`MediaType::File`]

use crate::config::Config;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use url::Url;

/// Repository media type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaType {
    Image,
    Document,
    Audio,
    Video,
    RemoteVideo,
    ExtractedText,
    File,
    /// Site-specific type named in configuration
    Other(String),
}

impl MediaType {
    pub fn as_str(&self) -> &str {
        match self {
            MediaType::Image => "image",
            MediaType::Document => "document",
            MediaType::Audio => "audio",
            MediaType::Video => "video",
            MediaType::RemoteVideo => "remote_video",
            MediaType::ExtractedText => "extracted_text",
            MediaType::File => "file",
            MediaType::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "image" => MediaType::Image,
            "document" => MediaType::Document,
            "audio" => MediaType::Audio,
            "video" => MediaType::Video,
            "remote_video" => MediaType::RemoteVideo,
            "extracted_text" => MediaType::ExtractedText,
            "file" => MediaType::File,
            other => MediaType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MediaType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Hosts whose URLs are remote video; a host matches itself and its subdomains
const REMOTE_VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be", "vimeo.com"];

/// Lowercase extension -> media type, checked in order
const EXTENSION_TABLE: &[(&str, MediaType)] = &[
    ("png", MediaType::Image),
    ("gif", MediaType::Image),
    ("jpg", MediaType::Image),
    ("jpeg", MediaType::Image),
    ("pdf", MediaType::Document),
    ("doc", MediaType::Document),
    ("docx", MediaType::Document),
    ("ppt", MediaType::Document),
    ("pptx", MediaType::Document),
    ("odt", MediaType::Document),
    ("tif", MediaType::File),
    ("tiff", MediaType::File),
    ("jp2", MediaType::File),
    ("zip", MediaType::File),
    ("tar", MediaType::File),
    ("mp3", MediaType::Audio),
    ("wav", MediaType::Audio),
    ("aac", MediaType::Audio),
    ("mp4", MediaType::Video),
    ("txt", MediaType::ExtractedText),
];

/// Resolve the media type for a file path or URL
pub fn media_type_for(file: &str, config: &Config) -> MediaType {
    if let Some(forced) = &config.media_type {
        return MediaType::from_name(forced);
    }

    let remote = Url::parse(file)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"));
    if let Some(url) = &remote {
        if url.host_str().is_some_and(is_remote_video_host) {
            return MediaType::RemoteVideo;
        }
    }

    let extension = match &remote {
        Some(url) => extension_of(url.path()),
        None => extension_of(file),
    };
    let Some(extension) = extension else {
        return MediaType::File;
    };

    for (name, extensions) in &config.media_types {
        if extensions
            .iter()
            .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(&extension))
        {
            return MediaType::from_name(name);
        }
    }

    EXTENSION_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == extension)
        .map(|(_, media_type)| media_type.clone())
        .unwrap_or(MediaType::File)
}

fn is_remote_video_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    REMOTE_VIDEO_HOSTS
        .iter()
        .any(|known| host == *known || host.ends_with(&format!(".{known}")))
}

fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let config = Config::default();
        for (file, expected) in [
            ("/tmp/foo.tif", MediaType::File),
            ("/tmp/foo.TIF", MediaType::File),
            ("/tmp/foo.mp4", MediaType::Video),
            ("/tmp/foo.MP4", MediaType::Video),
            ("/tmp/foo.png", MediaType::Image),
            ("/tmp/foo.pptx", MediaType::Document),
            ("/tmp/foo.Pptx", MediaType::Document),
            ("/tmp/foo.xxx", MediaType::File),
            ("/tmp/noextension", MediaType::File),
            ("https://example.com/files/report.pdf", MediaType::Document),
        ] {
            assert_eq!(media_type_for(file, &config), expected, "{file}");
        }
    }

    #[test]
    fn test_remote_video() {
        let config = Config::default();
        assert_eq!(media_type_for("https://youtu.be/xxxx", &config), MediaType::RemoteVideo);
        assert_eq!(
            media_type_for("https://www.youtube.com/watch?v=abc", &config),
            MediaType::RemoteVideo
        );
        assert_eq!(media_type_for("https://vimeo.com/xxxx", &config), MediaType::RemoteVideo);
        assert_eq!(media_type_for("https://notvimeo.com/x.mp4", &config), MediaType::Video);
    }

    #[test]
    fn test_configured_extensions_win() {
        let mut config = Config::default();
        config.media_types.insert("sometextmedia".into(), vec!["txt".into()]);
        assert_eq!(
            media_type_for("/tmp/foo.txt", &config),
            MediaType::Other("sometextmedia".into())
        );
        assert_eq!(media_type_for("/tmp/foo.png", &config), MediaType::Image);
    }

    #[test]
    fn test_forced_media_type() {
        let config = Config {
            media_type: Some("foo".into()),
            ..Config::default()
        };
        assert_eq!(media_type_for("/tmp/foo.png", &config).as_str(), "foo");
        assert_eq!(media_type_for("https://youtu.be/xxxx", &config).as_str(), "foo");
    }
}
