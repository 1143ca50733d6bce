use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{
    error::PluginError,
    plugin::{Plugin, RealtimeStream, Stream},
};
use crate::{configs::Config, realtime::StreamOptions};

const STREAM_PROTO: &str = "wss";
const STREAM_HOST: &str = "edge1.tvbetstream.com:4433";
const ORIGIN: &str = "http://sportstream-365.com";

pub struct Ss365Plugin {
    url_regex: Regex,
    bandwidth: u64,
    options: StreamOptions,
}

impl Ss365Plugin {
    pub fn new(config: &Config) -> Result<Self, PluginError> {
        let mut options = config.stream.to_options(&config.http)?;
        options.client.origin = Some(ORIGIN.to_string());

        Ok(Self {
            url_regex: Regex::new(
                r"^https?://sportstream-365\.com/viewer\?gameId=(?P<channel>\d+)(?:&tagz=)?",
            )
            .unwrap(),
            bandwidth: config.ss365.bandwidth,
            options,
        })
    }

    fn channel<'a>(&self, url: &'a str) -> Option<&'a str> {
        self.url_regex
            .captures(url)
            .and_then(|c| c.name("channel"))
            .map(|m| m.as_str())
    }

    /// `wss://edge1.tvbetstream.com:4433/xsport{channel}_smooth_1?b={bandwidth}`
    pub fn stream_url(&self, channel: &str) -> String {
        format!(
            "{}://{}/xsport{}_smooth_1?b={}",
            STREAM_PROTO, STREAM_HOST, channel, self.bandwidth
        )
    }
}

#[async_trait]
impl Plugin for Ss365Plugin {
    fn name(&self) -> &str {
        "ss365"
    }

    fn can_handle_url(&self, url: &str) -> bool {
        self.url_regex.is_match(url)
    }

    async fn streams(&self, url: &str) -> Result<Vec<(String, Stream)>, PluginError> {
        let channel = self
            .channel(url)
            .ok_or_else(|| PluginError::UnsupportedUrl(url.to_string()))?;

        let stream_url = self.stream_url(channel);
        debug!("SS365 stream url: {}", stream_url);

        Ok(vec![(
            "live".to_string(),
            Stream::Realtime(RealtimeStream::new(stream_url, self.options.clone())),
        )])
    }
}
