pub mod ring;

pub use ring::RingBuffer;

/// Default ring capacity for realtime streams: 16 MiB.
pub const DEFAULT_RINGBUFFER_SIZE: usize = 16 * 1024 * 1024;
