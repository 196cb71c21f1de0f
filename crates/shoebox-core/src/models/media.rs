use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse media kind derived from the top-level MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

impl MediaKind {
    /// Classify a MIME type. Anything outside image/audio/video is not media.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let top_level = content_type.split('/').next().unwrap_or("").trim();
        match top_level.to_ascii_lowercase().as_str() {
            "image" => Some(MediaKind::Image),
            "audio" => Some(MediaKind::Audio),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}
