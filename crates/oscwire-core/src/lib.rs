//! oscwire core
//!
//! OpenSoundControl 1.0 wire codec: typed application values in, 4-byte
//! aligned self-describing packets out, and back again — including recursive
//! bundles with NTP-based execution timetags.
//!
//! This crate provides:
//! - The packet data model ([`OscPacket`], [`OscMessage`], [`OscValue`])
//! - Message and bundle encoding/decoding ([`codec`])
//! - Timetag conversion between Unix milliseconds and NTP form ([`OscTimeTag`])
//!
//! The codec is synchronous and stateless: every call is a pure function
//! over its input, safe to invoke from any number of threads. Malformed
//! input never panics — decoding returns an error or a best-effort partial
//! result (clipped UDP datagrams decode to whatever parsed cleanly).

pub mod codec;
pub mod error;
pub mod time;
pub mod types;

pub use codec::{decode, encode, is_bundle};
pub use error::{Error, Result};
pub use time::{OscTimeTag, NTP_UNIX_OFFSET};
pub use types::{OscBundle, OscMessage, OscPacket, OscValue};
