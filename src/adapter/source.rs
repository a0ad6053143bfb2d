//! Backend selection from a source URL.
//!
//! Embedded-provider links carry an 11-character video id:
//! - `https://www.youtube.com/watch?v=<id>`
//! - `https://youtu.be/<id>`
//! - `https://www.youtube.com/embed/<id>` (and `youtube-nocookie.com`)
//! - `https://www.youtube.com/shorts/<id>`, `/live/<id>`, `/v/<id>`
//!
//! Anything else is played as a direct file.

use once_cell::sync::Lazy;
use regex::Regex;

static EMBED_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.|m\.|music\.)?(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|embed/|shorts/|live/|v/)|youtube-nocookie\.com/embed/|youtu\.be/)([A-Za-z0-9_-]{11})(?:[?&#/]|$)",
    )
    .expect("embed URL pattern is valid")
});

/// Which backend a source needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Direct,
    Embedded,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Direct => "direct",
            BackendKind::Embedded => "embedded",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified playback source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Direct { url: String },
    Embedded { video_id: String },
}

impl SourceKind {
    pub fn detect(url: &str) -> Self {
        let trimmed = url.trim();
        match EMBED_URL.captures(trimmed).and_then(|c| c.get(1)) {
            Some(id) => SourceKind::Embedded {
                video_id: id.as_str().to_string(),
            },
            None => SourceKind::Direct {
                url: trimmed.to_string(),
            },
        }
    }

    pub fn backend(&self) -> BackendKind {
        match self {
            SourceKind::Direct { .. } => BackendKind::Direct,
            SourceKind::Embedded { .. } => BackendKind::Embedded,
        }
    }
}
