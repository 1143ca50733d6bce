//! Realtime stream bridge: a WebSocket push transport turned into a blocking
//! byte stream.

pub mod client;
pub mod error;
pub mod frame;
pub mod proxy;
pub mod reader;

pub use client::{ClientOptions, FrameClient};
pub use error::ClientError;
pub use proxy::{ProxyConfig, ProxyError};
pub use reader::{StreamOptions, StreamReader};
