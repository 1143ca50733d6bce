//! Background WebSocket worker feeding a [`RingBuffer`].
//!
//! The worker owns a single connection on its own thread and current-thread
//! runtime. Every binary message is stripped of its framing and written to
//! the buffer. The worker exits when the server closes, on the first
//! transport or framing error, or when [`FrameClient::stop`] is called; on
//! exit it always closes the buffer so the reading side reaches end of
//! stream instead of waiting for its timeout.

use std::{io, sync::Arc, thread, time::Duration};

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{
        client::IntoClientRequest,
        handshake::client::Request,
        http::{
            HeaderValue,
            header::{ORIGIN, USER_AGENT},
        },
        protocol::Message,
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};
use url::Url;

use super::{error::ClientError, frame, proxy::ProxyConfig};
use crate::buffer::RingBuffer;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound on sending the Close frame when stopping.
const CLOSE_SEND_TIMEOUT_MS: u64 = 1000;

/// Handshake options of a realtime connection.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub user_agent: Option<String>,
    pub origin: Option<String>,
    pub proxy: Option<ProxyConfig>,
}

pub struct FrameClient {
    url: String,
    options: ClientOptions,
    buffer: Arc<RingBuffer>,
    cancel: CancellationToken,
    worker: Option<thread::JoinHandle<()>>,
}

impl Drop for FrameClient {
    fn drop(&mut self) {
        self.stop();
    }
}

impl FrameClient {
    pub fn new(url: impl Into<String>, buffer: Arc<RingBuffer>, options: ClientOptions) -> Self {
        Self {
            url: url.into(),
            options,
            buffer,
            cancel: CancellationToken::new(),
            worker: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Spawns the worker thread. The thread is detached from process
    /// shutdown: nothing joins it unless [`FrameClient::join`] is called.
    pub fn start(&mut self) -> io::Result<()> {
        if self.worker.is_some() || self.cancel.is_cancelled() {
            return Ok(());
        }

        let worker = Worker {
            url: self.url.clone(),
            options: self.options.clone(),
            buffer: self.buffer.clone(),
            cancel: self.cancel.clone(),
        };

        let handle = thread::Builder::new()
            .name("frame-client".to_string())
            .spawn(move || worker.run())?;
        self.worker = Some(handle);
        Ok(())
    }

    /// Signals the worker to stop and closes the buffer. Closing releases a
    /// worker blocked on a full buffer; the connection itself is closed from
    /// the worker side.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            debug!("[{}] Stopping WebSocket client...", self.url);
            self.cancel.cancel();
        }
        self.buffer.close();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits for the worker thread to exit. Returns `false` if it panicked.
    pub fn join(&mut self) -> bool {
        match self.worker.take() {
            Some(handle) => handle.join().is_ok(),
            None => true,
        }
    }
}

struct Worker {
    url: String,
    options: ClientOptions,
    buffer: Arc<RingBuffer>,
    cancel: CancellationToken,
}

impl Worker {
    fn run(self) {
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.session()),
            Err(e) => error!("[{}] Failed to start client runtime: {}", self.url, e),
        }

        self.cancel.cancel();
        self.buffer.close();
    }

    async fn session(&self) {
        if self.cancel.is_cancelled() {
            return;
        }

        match self.stream().await {
            Ok(()) => debug!("[{}] Disconnected from WebSocket server", self.url),
            Err(e) => error!("[{}] WebSocket client error: {}", self.url, e),
        }
    }

    async fn stream(&self) -> Result<(), ClientError> {
        let request = self.request()?;
        let ws = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(()),
            ws = self.connect(request) => ws?,
        };
        let (mut write, mut read) = ws.split();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    match tokio::time::timeout(
                        Duration::from_millis(CLOSE_SEND_TIMEOUT_MS),
                        write.send(Message::Close(None)),
                    )
                    .await
                    {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => trace!("[{}] Close frame not sent: {}", self.url, e),
                        Err(_) => debug!(
                            "[{}] Close frame not sent within {}ms",
                            self.url, CLOSE_SEND_TIMEOUT_MS
                        ),
                    }
                    return Ok(());
                }
                msg = read.next() => {
                    let msg = match msg {
                        Some(Ok(msg)) => msg,
                        Some(Err(e)) => return Err(e.into()),
                        None => return Ok(()),
                    };

                    match msg {
                        Message::Binary(data) => self.on_frame(data)?,
                        Message::Close(frame) => {
                            debug!("[{}] Server closed the stream: {:?}", self.url, frame);
                            return Ok(());
                        }
                        Message::Text(text) => {
                            warn!("[{}] Ignoring text message ({} bytes)", self.url, text.len());
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn on_frame(&self, data: bytes::Bytes) -> Result<(), ClientError> {
        if self.cancel.is_cancelled() {
            return Ok(());
        }

        match frame::payload(&data)? {
            Some(payload) => {
                // The runtime is private to this thread, so waiting on buffer
                // space here only stalls this connection.
                let written = self.buffer.write(&payload);
                if written < payload.len() {
                    debug!("[{}] Buffer closed, dropped {} bytes", self.url, payload.len() - written);
                }
            }
            None => trace!("[{}] Keepalive frame", self.url),
        }
        Ok(())
    }

    fn request(&self) -> Result<Request, ClientError> {
        let mut request = self.url.as_str().into_client_request()?;
        let headers = request.headers_mut();

        if let Some(ua) = &self.options.user_agent {
            headers.insert(USER_AGENT, header_value(ua)?);
        }
        if let Some(origin) = &self.options.origin {
            headers.insert(ORIGIN, header_value(origin)?);
        }
        Ok(request)
    }

    async fn connect(&self, request: Request) -> Result<WsStream, ClientError> {
        let Some(proxy) = &self.options.proxy else {
            debug!("Connecting to {} without proxy", self.url);
            let (ws, _) = tokio_tungstenite::connect_async(request).await?;
            return Ok(ws);
        };

        debug!(
            "Connecting to {} via proxy ({}://{}:{})",
            self.url,
            proxy.scheme,
            proxy.host,
            proxy.port_or_default()
        );

        let target = Url::parse(&self.url)?;
        let host = target
            .host_str()
            .ok_or_else(|| ClientError::MissingHost(self.url.clone()))?;
        let port = target
            .port_or_known_default()
            .ok_or_else(|| ClientError::MissingHost(self.url.clone()))?;

        let stream = super::proxy::tunnel(proxy, host, port).await?;
        let (ws, _) = tokio_tungstenite::client_async_tls(request, stream).await?;
        Ok(ws)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(value).map_err(|e| ClientError::InvalidHeader(format!("{value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(options: ClientOptions) -> Worker {
        Worker {
            url: "wss://edge.example:4433/xsport1_smooth_1?b=1000000".into(),
            options,
            buffer: Arc::new(RingBuffer::new(64)),
            cancel: CancellationToken::new(),
        }
    }

    #[test]
    fn request_carries_handshake_headers() {
        let w = worker(ClientOptions {
            user_agent: Some("Mozilla/5.0 test".into()),
            origin: Some("http://sportstream-365.com".into()),
            proxy: None,
        });
        let request = w.request().unwrap();
        assert_eq!(request.headers()[USER_AGENT], "Mozilla/5.0 test");
        assert_eq!(request.headers()[ORIGIN], "http://sportstream-365.com");
        assert_eq!(request.uri().host(), Some("edge.example"));
    }

    #[test]
    fn request_rejects_bad_header_value() {
        let w = worker(ClientOptions {
            user_agent: Some("bad\nvalue".into()),
            ..Default::default()
        });
        assert!(matches!(w.request(), Err(ClientError::InvalidHeader(_))));
    }

    #[test]
    fn frames_are_stripped_into_buffer() {
        let w = worker(ClientOptions::default());

        let mut extended = vec![0u8; 23];
        extended[0] = frame::TAG_EXTENDED;
        extended[18] = 3;
        extended.extend_from_slice(b"abc");

        w.on_frame(bytes::Bytes::from(extended)).unwrap();
        w.on_frame(bytes::Bytes::from_static(b"\x07ping")).unwrap();
        w.on_frame(bytes::Bytes::from_static(b"\x02123456789def")).unwrap();

        assert_eq!(w.buffer.read(64, false, None), b"abcdef");
    }

    #[test]
    fn empty_frame_is_an_error() {
        let w = worker(ClientOptions::default());
        assert!(matches!(
            w.on_frame(bytes::Bytes::new()),
            Err(ClientError::Frame(frame::FrameError::Empty))
        ));
    }

    #[test]
    fn frames_after_stop_are_ignored() {
        let w = worker(ClientOptions::default());
        w.cancel.cancel();
        w.on_frame(bytes::Bytes::from_static(b"\x00data")).unwrap();
        assert!(w.buffer.is_empty());
    }

    #[test]
    fn stopped_client_never_starts() {
        let buffer = Arc::new(RingBuffer::new(16));
        let mut client = FrameClient::new("ws://127.0.0.1:9/", buffer.clone(), ClientOptions::default());
        client.stop();
        client.start().unwrap();
        assert!(client.is_stopped());
        assert!(client.join());
        assert!(buffer.is_closed());
    }

    #[test]
    fn stop_releases_worker_blocked_on_full_buffer() {
        use std::{
            sync::mpsc,
            time::{Duration, Instant},
        };

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                let (stream, _) = listener.accept().await.unwrap();
                let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                ws.send(Message::binary(vec![0x47u8; 100])).await.unwrap();
                while let Some(Ok(msg)) = ws.next().await {
                    if msg.is_close() {
                        break;
                    }
                }
            })
        });

        let buffer = Arc::new(RingBuffer::new(8));
        let mut client = FrameClient::new(format!("ws://{addr}/"), buffer.clone(), ClientOptions::default());
        client.start().unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while buffer.free() > 0 {
            assert!(Instant::now() < deadline, "buffer never filled");
            thread::sleep(Duration::from_millis(10));
        }

        client.stop();
        assert!(buffer.is_closed());

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(client.join());
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(true));
        assert_eq!(buffer.read(64, false, None), vec![0x47u8; 8]);
        server.join().unwrap();
    }
}
