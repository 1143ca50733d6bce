//! Recovery of media URLs hidden in ZTNR thumbnail containers.
//!
//! The container is a PNG-like chunk stream delivered as base64. Some of its
//! `tEXt` chunks hold records of the form
//! `alphabet_raw # quality %% ciphertext`, each deciphered independently.

pub mod cipher;
pub mod error;
pub mod reader;

use std::io::{Cursor, Read};

use tracing::debug;

pub use self::{
    cipher::decipher,
    error::ZtnrError,
    reader::{ByteSource, Chunk, ChunkReader},
};

/// A deciphered URL with the quality label it was published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedUrl {
    pub quality: String,
    pub url: String,
}

/// One obfuscated record, borrowed from the text of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObfuscatedRecord<'a> {
    pub alphabet_raw: &'a str,
    pub quality: &'a str,
    pub ciphertext: &'a str,
}

impl<'a> ObfuscatedRecord<'a> {
    /// `None` when either separator is absent; such text is not a record.
    pub fn parse(text: &'a str) -> Option<Self> {
        let (alphabet_raw, rest) = text.split_once('#')?;
        let (quality, ciphertext) = rest.split_once("%%")?;
        Some(Self {
            alphabet_raw,
            quality,
            ciphertext,
        })
    }

    pub fn decode(&self) -> DecodedUrl {
        DecodedUrl {
            quality: self.quality.to_string(),
            url: decipher(self.alphabet_raw, self.ciphertext),
        }
    }
}

/// Iterator over the records of a container, in chunk order.
pub struct Translate<R = Cursor<Vec<u8>>> {
    chunks: ChunkReader<R>,
}

impl<R: Read> Translate<R> {
    pub fn new(chunks: ChunkReader<R>) -> Self {
        Self { chunks }
    }
}

impl<R: Read> Iterator for Translate<R> {
    type Item = DecodedUrl;

    fn next(&mut self) -> Option<DecodedUrl> {
        for chunk in self.chunks.by_ref() {
            if chunk.is_end() {
                return None;
            }
            if !chunk.is_text() {
                continue;
            }

            let text = chunk.text();
            match ObfuscatedRecord::parse(&text) {
                Some(record) => return Some(record.decode()),
                None => debug!("skipping tEXt chunk without a record ({} bytes)", chunk.len()),
            }
        }
        None
    }
}

/// Decodes `blob` and lazily yields every record it contains.
pub fn translate(blob: &str) -> Result<Translate, ZtnrError> {
    let source = ByteSource::from_base64(blob)?;
    Ok(Translate::new(ChunkReader::new(source)))
}

/// The URL a player should use out of a container's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferredUrl {
    /// Variant playlist, handed to an HLS parser.
    Hls(String),
    /// Progressive file download.
    Progressive(String),
}

/// First `.m3u8` URL by path suffix, else the first `.mp4` URL. Output of the
/// cipher is untrusted, so anything that does not parse as a URL is ignored.
pub fn select_preferred(urls: &[DecodedUrl]) -> Option<PreferredUrl> {
    let first_with_suffix = |suffix: &str| {
        urls.iter()
            .find(|decoded| path_ends_with(&decoded.url, suffix))
            .map(|decoded| decoded.url.clone())
    };

    first_with_suffix(".m3u8")
        .map(PreferredUrl::Hls)
        .or_else(|| first_with_suffix(".mp4").map(PreferredUrl::Progressive))
}

fn path_ends_with(raw: &str, suffix: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| u.path().ends_with(suffix))
        .unwrap_or(false)
}
