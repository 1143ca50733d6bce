use std::time::Duration;

use reqwest::{Client, Proxy};
use tracing::debug;

use crate::configs::HttpConfig;

pub struct HttpClient;

impl HttpClient {
  /// Async client for page and API fetches, honouring the configured user
  /// agent, timeout and proxy.
  pub fn new(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
      .user_agent(config.user_agent.clone())
      .cookie_store(true)
      .timeout(Duration::from_secs(config.timeout_secs));

    if let Some(p_url) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
      builder = builder.proxy(Proxy::all(p_url)?);
      debug!("Configured proxy for HttpClient: {}", p_url);
    }

    builder.build()
  }
}
