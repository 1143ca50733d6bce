use thiserror::Error;

use super::{frame::FrameError, proxy::ProxyError};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid stream url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("stream url has no host: {0}")]
    MissingHost(String),
    #[error("invalid handshake header: {0}")]
    InvalidHeader(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("proxy error: {0}")]
    Proxy(#[from] ProxyError),
    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
