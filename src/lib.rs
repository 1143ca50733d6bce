//! Core pieces of the streaming plugins: recovery of obfuscated media URLs
//! ([`ztnr`]) and a blocking byte stream over a realtime WebSocket push
//! transport ([`realtime`], [`buffer`]).

pub mod buffer;
pub mod common;
pub mod configs;
pub mod plugins;
pub mod realtime;
pub mod ztnr;
