use thiserror::Error;

use crate::{realtime::ProxyError, ztnr::ZtnrError};

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("decode error: {0}")]
    Decode(#[from] ZtnrError),
    #[error("proxy error: {0}")]
    Proxy(#[from] ProxyError),
    #[error("unsupported url: {0}")]
    UnsupportedUrl(String),
}
