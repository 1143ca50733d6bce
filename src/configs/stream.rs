use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    buffer::DEFAULT_RINGBUFFER_SIZE,
    configs::HttpConfig,
    realtime::{ClientOptions, ProxyConfig, ProxyError, StreamOptions},
};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StreamConfig {
    pub ringbuffer_size: usize,
    /// Read timeout in seconds; 0 waits without a limit.
    pub timeout_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ringbuffer_size: DEFAULT_RINGBUFFER_SIZE,
            timeout_secs: 60,
        }
    }
}

impl StreamConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Realtime stream options; the handshake origin is left to the plugin.
    pub fn to_options(&self, http: &HttpConfig) -> Result<StreamOptions, ProxyError> {
        let proxy = match http.proxy.as_deref() {
            Some(raw) => ProxyConfig::parse(raw)?,
            None => None,
        };

        Ok(StreamOptions {
            buffer_size: self.ringbuffer_size,
            timeout: self.timeout(),
            client: ClientOptions {
                user_agent: Some(http.user_agent.clone()),
                origin: None,
                proxy,
            },
        })
    }
}
