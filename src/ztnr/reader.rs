//! Forward-only reader for the length-prefixed chunk container.
//!
//! Layout: an 8-byte preamble, then chunks of
//! `length: u32 (big endian) | tag: [u8; 4] | payload | trailer: [u8; 4]`.
//! The preamble and the trailer are never validated.

use std::{
    borrow::Cow,
    io::{self, Cursor, Read},
};

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use byteorder::{BigEndian, ReadBytesExt};
use tracing::trace;

use super::error::ZtnrError;

pub const PREAMBLE_LEN: u64 = 8;
pub const TRAILER_LEN: u64 = 4;

pub const TEXT_TAG: [u8; 4] = *b"tEXt";
pub const END_TAG: [u8; 4] = *b"IEND";

/// Payload buffers start at most this large; a bogus length prefix must not
/// turn into a multi-gigabyte allocation.
const MAX_PREALLOC: usize = 64 * 1024;

/// Standard alphabet, padding optional.
const BLOB_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Sequential byte reads over a decoded container.
///
/// Read failures of the inner reader are reported as short reads, which the
/// chunk reader in turn treats as the end of the container.
pub struct ByteSource<R = Cursor<Vec<u8>>> {
    inner: R,
}

impl ByteSource {
    /// Decodes a base64 blob. Line breaks are stripped first, the servers wrap
    /// long blobs.
    pub fn from_base64(blob: &str) -> Result<Self, ZtnrError> {
        let cleaned: String = blob.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        let bytes = BLOB_ENGINE.decode(cleaned.trim())?;
        Ok(Self::new(Cursor::new(bytes)))
    }
}

impl<R: Read> ByteSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        self.inner.read_u8().ok()
    }

    /// Reads up to `n` bytes. A short result means the source ran dry.
    pub fn read_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(n.min(MAX_PREALLOC));
        if let Err(e) = (&mut self.inner).take(n as u64).read_to_end(&mut out) {
            trace!("byte source read failed after {} bytes: {}", out.len(), e);
        }
        out
    }

    /// Discards up to `n` bytes, returning how many were actually skipped.
    pub fn skip(&mut self, n: u64) -> u64 {
        io::copy(&mut (&mut self.inner).take(n), &mut io::sink()).unwrap_or(0)
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        self.inner.read_u32::<BigEndian>().ok()
    }

    pub fn read_tag(&mut self) -> Option<[u8; 4]> {
        let mut tag = [0u8; 4];
        self.inner.read_exact(&mut tag).ok()?;
        Some(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub tag: [u8; 4],
    pub payload: Vec<u8>,
}

impl Chunk {
    pub fn tag_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.tag)
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }

    pub fn is_end(&self) -> bool {
        self.tag == END_TAG
    }

    /// Payload as Latin-1 text with NUL bytes dropped. Text chunks separate
    /// keyword and value with a NUL, which the record format ignores.
    pub fn text(&self) -> String {
        self.payload
            .iter()
            .filter(|&&b| b > 0)
            .map(|&b| b as char)
            .collect()
    }
}

/// Lazy, finite sequence of chunks.
///
/// Yields the `IEND` chunk and then stops. A payload shorter than its
/// declared length also ends the sequence; chunks already yielded stay valid.
pub struct ChunkReader<R = Cursor<Vec<u8>>> {
    source: ByteSource<R>,
    started: bool,
    finished: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(source: ByteSource<R>) -> Self {
        Self {
            source,
            started: false,
            finished: false,
        }
    }

    fn read_chunk(&mut self) -> Option<Chunk> {
        let size = self.source.read_u32()? as usize;
        let tag = self.source.read_tag()?;
        let payload = self.source.read_bytes(size);
        if payload.len() != size {
            trace!(
                "chunk {:?} truncated: declared {} bytes, got {}",
                String::from_utf8_lossy(&tag),
                size,
                payload.len()
            );
            return None;
        }
        self.source.skip(TRAILER_LEN);
        Some(Chunk { tag, payload })
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            self.source.skip(PREAMBLE_LEN);
        }

        match self.read_chunk() {
            Some(chunk) => {
                if chunk.is_end() {
                    self.finished = true;
                }
                Some(chunk)
            }
            None => {
                self.finished = true;
                None
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for ChunkReader<R> {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

    pub(crate) fn encode_chunk(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(tag);
        out.extend_from_slice(payload);
        out.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    }

    pub(crate) fn container(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        for (tag, payload) in chunks {
            encode_chunk(&mut out, tag, payload);
        }
        out
    }

    fn reader(bytes: Vec<u8>) -> ChunkReader {
        ChunkReader::new(ByteSource::new(Cursor::new(bytes)))
    }

    #[test]
    fn yields_chunks_in_order() {
        let bytes = container(&[
            (b"IHDR", &[0u8; 13]),
            (b"tEXt", b"hello"),
            (b"IDAT", &[7u8; 300]),
        ]);

        let chunks: Vec<Chunk> = reader(bytes).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].tag_str(), "IHDR");
        assert_eq!(chunks[0].len(), 13);
        assert_eq!(chunks[1].payload, b"hello");
        assert_eq!(chunks[2].tag_str(), "IDAT");
        assert_eq!(chunks[2].len(), 300);
    }

    #[test]
    fn truncated_last_payload_ends_sequence() {
        let mut bytes = container(&[(b"IHDR", &[1u8; 13]), (b"tEXt", b"first")]);
        encode_chunk(&mut bytes, b"IDAT", &[9u8; 64]);
        // drop the trailer and half of the last payload
        bytes.truncate(bytes.len() - 4 - 32);

        let chunks: Vec<Chunk> = reader(bytes).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].payload, b"first");
    }

    #[test]
    fn stops_after_end_chunk() {
        let bytes = container(&[
            (b"tEXt", b"a"),
            (b"IEND", b""),
            (b"tEXt", b"after the end"),
        ]);

        let chunks: Vec<Chunk> = reader(bytes).collect();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].is_end());
    }

    #[test]
    fn missing_trailer_on_last_chunk_is_tolerated() {
        let mut bytes = container(&[(b"tEXt", b"x")]);
        bytes.truncate(bytes.len() - 4);

        let chunks: Vec<Chunk> = reader(bytes).collect();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn huge_declared_length_is_not_fatal() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(b"IDAT");
        bytes.extend_from_slice(&[0u8; 16]);

        assert_eq!(reader(bytes).count(), 0);
    }

    #[test]
    fn empty_and_preamble_only_inputs() {
        assert_eq!(reader(Vec::new()).count(), 0);
        assert_eq!(reader(PNG_SIGNATURE.to_vec()).count(), 0);
    }

    #[test]
    fn from_base64_strips_line_breaks() {
        let bytes = container(&[(b"tEXt", b"wrapped")]);
        let encoded = STANDARD.encode(&bytes);
        let wrapped: String = encoded
            .as_bytes()
            .chunks(10)
            .map(|c| format!("{}\n", String::from_utf8_lossy(c)))
            .collect();

        let chunks: Vec<Chunk> = ChunkReader::new(ByteSource::from_base64(&wrapped).unwrap()).collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].payload, b"wrapped");
    }

    #[test]
    fn from_base64_rejects_garbage() {
        assert!(ByteSource::from_base64("not*base64!").is_err());
    }

    #[test]
    fn text_drops_nul_and_maps_latin1() {
        let chunk = Chunk {
            tag: TEXT_TAG,
            payload: vec![b'k', 0, b'v', 0xe9],
        };
        assert_eq!(chunk.text(), "kv\u{e9}");
    }
}
