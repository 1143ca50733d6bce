//! Framing of the binary messages pushed by the realtime edge servers.
//!
//! The first byte of every message selects its layout:
//!
//! | tag | header                                               |
//! |-----|------------------------------------------------------|
//! | 1   | `20 + u` bytes, `u` is a u16 LE at offsets 18..20    |
//! | 2   | 10 bytes                                             |
//! | 7   | keepalive, the whole message is dropped              |
//! | any | none, the message is forwarded as is                 |

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use thiserror::Error;

pub const TAG_EXTENDED: u8 = 1;
pub const TAG_FIXED: u8 = 2;
pub const TAG_KEEPALIVE: u8 = 7;

const EXTENDED_BASE_LEN: usize = 20;
const EXTENDED_LEN_OFFSET: usize = 18;
const FIXED_HEADER_LEN: usize = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("extended frame too short for its header length field ({0} bytes)")]
    MissingHeaderLength(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Extended,
    Fixed,
    Keepalive,
    Raw,
}

impl FrameKind {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            TAG_EXTENDED => Self::Extended,
            TAG_FIXED => Self::Fixed,
            TAG_KEEPALIVE => Self::Keepalive,
            _ => Self::Raw,
        }
    }
}

/// Offset of the payload within `frame`, `None` for keepalives.
pub fn header_len(frame: &[u8]) -> Result<Option<usize>, FrameError> {
    let tag = *frame.first().ok_or(FrameError::Empty)?;

    let len = match FrameKind::from_tag(tag) {
        FrameKind::Keepalive => return Ok(None),
        FrameKind::Extended => {
            let field = frame
                .get(EXTENDED_LEN_OFFSET..EXTENDED_LEN_OFFSET + 2)
                .ok_or(FrameError::MissingHeaderLength(frame.len()))?;
            EXTENDED_BASE_LEN + LittleEndian::read_u16(field) as usize
        }
        FrameKind::Fixed => FIXED_HEADER_LEN,
        FrameKind::Raw => 0,
    };
    Ok(Some(len))
}

/// Payload of `frame` with its header stripped, sharing the frame's storage.
///
/// A header that claims more bytes than the frame holds leaves an empty
/// payload.
pub fn payload(frame: &Bytes) -> Result<Option<Bytes>, FrameError> {
    Ok(header_len(frame)?.map(|offset| frame.slice(offset.min(frame.len())..)))
}
