use std::fmt;

use async_trait::async_trait;

use super::error::PluginError;
use crate::realtime::{ClientError, StreamOptions, StreamReader};

/// A subtitle track for an external muxer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtitle {
    pub lang: String,
    pub url: String,
}

/// A realtime WebSocket stream, opened on demand.
#[derive(Debug, Clone)]
pub struct RealtimeStream {
    pub url: String,
    pub options: StreamOptions,
}

impl RealtimeStream {
    pub fn new(url: impl Into<String>, options: StreamOptions) -> Self {
        Self {
            url: url.into(),
            options,
        }
    }

    /// Starts the worker and returns the reader over its buffer.
    pub fn open(&self) -> Result<StreamReader, ClientError> {
        let mut reader = StreamReader::new(self.url.clone(), self.options.clone());
        reader.open()?;
        Ok(reader)
    }
}

/// What a plugin resolved a page into.
#[derive(Debug, Clone)]
pub enum Stream {
    /// Variant playlist, expanded by an external HLS parser.
    Hls { url: String, subtitles: Vec<Subtitle> },
    /// Progressive download.
    Http { url: String },
    Realtime(RealtimeStream),
}

impl Stream {
    pub fn url(&self) -> &str {
        match self {
            Self::Hls { url, .. } | Self::Http { url } => url,
            Self::Realtime(stream) => &stream.url,
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hls { url, subtitles } if !subtitles.is_empty() => {
                let langs: Vec<&str> = subtitles.iter().map(|s| s.lang.as_str()).collect();
                write!(f, "<HLSStream({url:?}, subtitles={})>", langs.join(","))
            }
            Self::Hls { url, .. } => write!(f, "<HLSStream({url:?})>"),
            Self::Http { url } => write!(f, "<HTTPStream({url:?})>"),
            Self::Realtime(stream) => write!(f, "<RealtimeStream({:?})>", stream.url),
        }
    }
}

/// Trait that all site plugins must implement.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique identifier (e.g. "rtve", "ss365").
    fn name(&self) -> &str;

    fn can_handle_url(&self, url: &str) -> bool;

    /// Resolve a page URL into `(quality, stream)` pairs. An empty list means
    /// the page currently offers nothing playable.
    async fn streams(&self, url: &str) -> Result<Vec<(String, Stream)>, PluginError>;
}

pub type BoxedPlugin = Box<dyn Plugin>;
