use std::{
    io::{self, Read},
    sync::Arc,
    time::Duration,
};

use tracing::debug;

use super::{
    client::{ClientOptions, FrameClient},
    error::ClientError,
};
use crate::buffer::{DEFAULT_RINGBUFFER_SIZE, RingBuffer};

#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Ring capacity in bytes.
    pub buffer_size: usize,
    /// Longest a read waits for data. `None` waits until data or close.
    pub timeout: Option<Duration>,
    pub client: ClientOptions,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_RINGBUFFER_SIZE,
            timeout: Some(Duration::from_secs(60)),
            client: ClientOptions::default(),
        }
    }
}

/// Pull-based facade over a realtime WebSocket stream.
///
/// [`StreamReader::open`] allocates the ring and starts the worker; reads
/// then block up to the configured timeout while the worker runs and never
/// block once it has stopped.
pub struct StreamReader {
    url: String,
    options: StreamOptions,
    buffer: Option<Arc<RingBuffer>>,
    client: Option<FrameClient>,
}

impl StreamReader {
    pub fn new(url: impl Into<String>, options: StreamOptions) -> Self {
        Self {
            url: url.into(),
            options,
            buffer: None,
            client: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn open(&mut self) -> Result<(), ClientError> {
        if self.buffer.is_some() {
            return Ok(());
        }

        debug!("Buffer size: {}", self.options.buffer_size);
        let buffer = Arc::new(RingBuffer::new(self.options.buffer_size));

        debug!("Starting WebSocket client");
        let mut client = FrameClient::new(self.url.clone(), buffer.clone(), self.options.client.clone());
        client.start()?;

        self.buffer = Some(buffer);
        self.client = Some(client);
        Ok(())
    }

    /// `true` while the worker has neither stopped nor been told to stop.
    pub fn is_running(&self) -> bool {
        self.client.as_ref().is_some_and(|c| !c.is_stopped())
    }

    /// Up to `size` bytes. Empty when the reader was never opened, when the
    /// stream ended, or when the timeout elapsed with nothing buffered.
    pub fn read(&self, size: usize) -> Vec<u8> {
        let Some(buffer) = &self.buffer else {
            return Vec::new();
        };
        buffer.read(size, self.is_running(), self.options.timeout)
    }

    pub fn close(&mut self) {
        if let Some(client) = &self.client {
            client.stop();
        }
        if let Some(buffer) = &self.buffer {
            buffer.close();
        }
    }

    /// Closes the stream and waits for the worker thread to exit.
    pub fn shutdown(&mut self) {
        self.close();
        if let Some(client) = self.client.as_mut() {
            client.join();
        }
    }
}

impl Read for StreamReader {
    /// `Ok(0)` means end of stream. A read that times out while the worker is
    /// still running fails with [`io::ErrorKind::TimedOut`] instead, so
    /// callers can tell a stall from the end.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let Some(buffer) = &self.buffer else {
            return Ok(0);
        };

        let running = self.is_running();
        let n = buffer.read_into(buf, running, self.options.timeout);
        if n == 0 && running && !buffer.is_closed() {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no stream data within {:?}", self.options.timeout),
            ));
        }
        Ok(n)
    }
}

impl Drop for StreamReader {
    fn drop(&mut self) {
        self.close();
    }
}
