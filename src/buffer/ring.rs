//! Fixed-size circular byte buffer shared by one producer and one consumer.
//!
//! Writes never overwrite unread data: a producer that runs out of space
//! waits until the consumer frees some, or until the buffer is closed. Reads
//! can wait for data with an optional timeout. Closing is one-way and wakes
//! every waiter.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

struct State {
    data: Box<[u8]>,
    read_pos: usize,
    write_pos: usize,
    length: usize,
    closed: bool,
}

impl State {
    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn free(&self) -> usize {
        self.capacity() - self.length
    }

    /// Copies as much of `chunk` as fits, returning the number of bytes taken.
    fn push(&mut self, chunk: &[u8]) -> usize {
        let size = self.capacity();
        let to_write = chunk.len().min(self.free());
        let available_at_end = size - self.write_pos;

        if to_write <= available_at_end {
            self.data[self.write_pos..self.write_pos + to_write].copy_from_slice(&chunk[..to_write]);
        } else {
            // Wrap around
            self.data[self.write_pos..].copy_from_slice(&chunk[..available_at_end]);
            self.data[..to_write - available_at_end]
                .copy_from_slice(&chunk[available_at_end..to_write]);
        }

        self.write_pos = (self.write_pos + to_write) % size;
        self.length += to_write;
        to_write
    }

    fn pop(&mut self, out: &mut [u8]) -> usize {
        let size = self.capacity();
        let to_read = out.len().min(self.length);
        let available_at_end = size - self.read_pos;

        if to_read <= available_at_end {
            out[..to_read].copy_from_slice(&self.data[self.read_pos..self.read_pos + to_read]);
        } else {
            out[..available_at_end].copy_from_slice(&self.data[self.read_pos..]);
            out[available_at_end..to_read].copy_from_slice(&self.data[..to_read - available_at_end]);
        }

        self.read_pos = (self.read_pos + to_read) % size;
        self.length -= to_read;
        to_read
    }
}

pub struct RingBuffer {
    state: Mutex<State>,
    data_available: Condvar,
    space_available: Condvar,
}

impl RingBuffer {
    /// Create a new `RingBuffer` holding up to `capacity` bytes. A zero
    /// capacity is bumped to one byte.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(State {
                data: vec![0u8; capacity].into_boxed_slice(),
                read_pos: 0,
                write_pos: 0,
                length: 0,
                closed: false,
            }),
            data_available: Condvar::new(),
            space_available: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().capacity()
    }

    /// How many bytes are currently available to read.
    pub fn len(&self) -> usize {
        self.state.lock().length
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many bytes can still be written before the buffer is full.
    pub fn free(&self) -> usize {
        self.state.lock().free()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Copy all of `chunk` into the buffer, waiting for space as needed.
    ///
    /// Returns the number of bytes stored. That is less than `chunk.len()`
    /// only when the buffer was closed first; the rest is dropped.
    pub fn write(&self, chunk: &[u8]) -> usize {
        let mut state = self.state.lock();
        let mut written = 0;

        while written < chunk.len() {
            if state.closed {
                break;
            }
            if state.free() == 0 {
                self.space_available.wait(&mut state);
                continue;
            }
            written += state.push(&chunk[written..]);
            self.data_available.notify_all();
        }
        written
    }

    /// Read up to `n` bytes. See [`RingBuffer::read_into`] for the waiting rules.
    ///
    /// Only what is buffered is allocated, so `n` may be arbitrarily large.
    pub fn read(&self, n: usize, block: bool, timeout: Option<Duration>) -> Vec<u8> {
        if n == 0 {
            return Vec::new();
        }

        let mut state = self.state.lock();
        if block {
            self.wait_for_data(&mut state, timeout.map(|t| Instant::now() + t));
        }

        let mut out = vec![0u8; n.min(state.length)];
        let read = state.pop(&mut out);
        if read > 0 {
            self.space_available.notify_all();
        }
        out
    }

    /// Fill `out` with as many buffered bytes as are available.
    ///
    /// With `block` set and the buffer empty, waits until data arrives, the
    /// buffer is closed or `timeout` elapses, then returns whatever is there
    /// (possibly nothing). A closed buffer never waits.
    pub fn read_into(&self, out: &mut [u8], block: bool, timeout: Option<Duration>) -> usize {
        if out.is_empty() {
            return 0;
        }

        let mut state = self.state.lock();
        if block {
            self.wait_for_data(&mut state, timeout.map(|t| Instant::now() + t));
        }

        let read = state.pop(out);
        if read > 0 {
            self.space_available.notify_all();
        }
        read
    }

    fn wait_for_data(&self, state: &mut MutexGuard<'_, State>, deadline: Option<Instant>) {
        while state.length == 0 && !state.closed {
            match deadline {
                Some(deadline) => {
                    if self.data_available.wait_until(state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.data_available.wait(state),
            }
        }
    }

    /// Mark the buffer closed and wake all waiters. Buffered bytes stay
    /// readable.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.data_available.notify_all();
        self.space_available.notify_all();
    }
}
