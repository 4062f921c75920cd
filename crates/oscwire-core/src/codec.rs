//! OSC 1.0 binary codec
//!
//! Wire layout (all multi-byte integers big-endian, everything padded with
//! zero bytes to the next 4-byte boundary):
//!
//! ```text
//! message := osc-string(address) osc-string(",<tags>") arg*
//! osc-string := bytes NUL pad          // total length % 4 == 0, min 4
//! bundle  := "#bundle\0" timetag element*
//! element := uint32(size) (message | bundle)
//! timetag := uint32(ntp-seconds) uint32(ntp-fraction)
//! ```
//!
//! Decoding is deliberately tolerant: a message clipped mid-argument yields
//! the arguments decoded before the cut, and a bundle with an unusable size
//! prefix yields the elements decoded before it. UDP clips datagrams; the
//! codec does not turn that into a hard failure.

use crate::time::OscTimeTag;
use crate::types::{OscBundle, OscMessage, OscPacket, OscValue};
use crate::{Error, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Marker prefix identifying a bundle packet
pub const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";

/// Bundle header size: marker plus timetag
pub const BUNDLE_HEADER_SIZE: usize = 16;

/// Ceiling on elements decoded per bundle level; excess is dropped
pub const MAX_BUNDLE_ELEMENTS: usize = 100;

/// Ceiling on bundle nesting depth during decode
pub const MAX_BUNDLE_DEPTH: usize = 32;

/// Type tag characters
pub mod tag {
    pub const INT32: u8 = b'i';
    pub const FLOAT32: u8 = b'f';
    pub const STRING: u8 = b's';
    pub const TRUE: u8 = b'T';
    pub const FALSE: u8 = b'F';
    pub const NIL: u8 = b'N';
    pub const BLOB: u8 = b'b';
    pub const SEPARATOR: u8 = b',';
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Encode a packet (message or bundle) to wire bytes
pub fn encode(packet: &OscPacket) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(estimate_packet_size(packet));
    encode_packet_to_buf(&mut buf, packet)?;
    Ok(buf.freeze())
}

/// Decode one complete packet, auto-detecting the bundle marker
pub fn decode(bytes: &[u8]) -> Result<OscPacket> {
    if bytes.is_empty() {
        return Err(Error::TruncatedBuffer { needed: 1, have: 0 });
    }
    decode_packet_at(bytes, 0)
}

/// Encode a single message
pub fn encode_message(message: &OscMessage) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(estimate_message_size(message));
    encode_message_to_buf(&mut buf, message)?;
    Ok(buf.freeze())
}

/// Decode a single message
///
/// The address is whatever bytes precede the first NUL; no `/` validation
/// happens here (malformed legacy senders are tolerated). A buffer cut off
/// mid-argument yields the arguments decoded so far.
pub fn decode_message(bytes: &[u8]) -> Result<OscMessage> {
    if bytes.is_empty() {
        return Err(Error::TruncatedBuffer { needed: 4, have: 0 });
    }

    let (address, mut pos) = read_padded_str(bytes, 0);

    let mut args = Vec::new();
    if pos < bytes.len() && bytes[pos] == tag::SEPARATOR {
        let (tags, next) = read_padded_str(bytes, pos);
        pos = next;

        for tag_byte in tags.bytes().skip(1) {
            match decode_arg(bytes, pos, tag_byte) {
                Ok((value, consumed)) => {
                    args.push(value);
                    pos += consumed;
                }
                // Legacy fallback: unknown tags skip a fixed 4 bytes. Only
                // correct for 4-byte payloads; kept for wire compatibility.
                Err(Error::UnsupportedTag(_)) => {
                    if bytes.len() - pos < 4 {
                        break;
                    }
                    pos += 4;
                }
                // Clipped datagram: keep what decoded cleanly
                Err(_) => break,
            }
        }
    }

    Ok(OscMessage { address, args })
}

/// Encode a single bundle
pub fn encode_bundle(bundle: &OscBundle) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(estimate_bundle_size(bundle));
    encode_bundle_to_buf(&mut buf, bundle)?;
    Ok(buf.freeze())
}

/// Decode a single bundle
pub fn decode_bundle(bytes: &[u8]) -> Result<OscBundle> {
    decode_bundle_at(bytes, 0)
}

/// Check whether a packet starts with the bundle marker
pub fn is_bundle(bytes: &[u8]) -> bool {
    bytes.len() >= BUNDLE_TAG.len() && &bytes[..BUNDLE_TAG.len()] == BUNDLE_TAG
}

// ============================================================================
// ENCODING
// ============================================================================

fn encode_packet_to_buf(buf: &mut BytesMut, packet: &OscPacket) -> Result<()> {
    match packet {
        OscPacket::Message(m) => encode_message_to_buf(buf, m),
        OscPacket::Bundle(b) => encode_bundle_to_buf(buf, b),
    }
}

fn encode_message_to_buf(buf: &mut BytesMut, message: &OscMessage) -> Result<()> {
    if message.address.is_empty() || !message.address.starts_with('/') {
        return Err(Error::InvalidAddress(message.address.clone()));
    }

    put_padded_str(buf, &message.address);
    put_padded_str(buf, &message.type_tags());

    for arg in &message.args {
        encode_arg(buf, arg);
    }

    Ok(())
}

fn encode_bundle_to_buf(buf: &mut BytesMut, bundle: &OscBundle) -> Result<()> {
    buf.extend_from_slice(BUNDLE_TAG);

    let (seconds, fraction) = bundle.timetag.to_ntp();
    buf.put_u32(seconds);
    buf.put_u32(fraction);

    // Each element is size-prefixed and fully encoded, nested bundles included
    for element in &bundle.elements {
        let mut inner = BytesMut::with_capacity(64);
        encode_packet_to_buf(&mut inner, element)?;
        buf.put_u32(inner.len() as u32);
        buf.extend_from_slice(&inner);
    }

    Ok(())
}

fn encode_arg(buf: &mut BytesMut, value: &OscValue) {
    match value {
        OscValue::Int32(i) => buf.put_i32(*i),
        OscValue::Float32(f) => buf.put_f32(*f),
        OscValue::Str(s) => put_padded_str(buf, s),
        // The type tag alone carries these
        OscValue::Bool(_) | OscValue::Nil => {}
        OscValue::Blob(data) => {
            buf.put_u32(data.len() as u32);
            buf.extend_from_slice(data);
            buf.put_bytes(0, (4 - data.len() % 4) % 4);
        }
    }
}

/// Write an OSC-string: bytes, NUL terminator, zero padding to a 4-byte
/// boundary. Total written is always a multiple of 4 and at least 4.
fn put_padded_str(buf: &mut BytesMut, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.put_bytes(0, 4 - s.len() % 4);
}

/// Pre-allocation estimate (avoids realloc on the hot path)
fn estimate_packet_size(packet: &OscPacket) -> usize {
    match packet {
        OscPacket::Message(m) => estimate_message_size(m),
        OscPacket::Bundle(b) => estimate_bundle_size(b),
    }
}

fn estimate_message_size(message: &OscMessage) -> usize {
    let args: usize = message
        .args
        .iter()
        .map(|arg| match arg {
            OscValue::Str(s) => s.len() + 4,
            OscValue::Blob(b) => b.len() + 8,
            _ => 4,
        })
        .sum();
    message.address.len() + 4 + message.args.len() + 4 + args
}

fn estimate_bundle_size(bundle: &OscBundle) -> usize {
    BUNDLE_HEADER_SIZE
        + bundle
            .elements
            .iter()
            .map(|e| 4 + estimate_packet_size(e))
            .sum::<usize>()
}

// ============================================================================
// DECODING
// ============================================================================

fn decode_packet_at(bytes: &[u8], depth: usize) -> Result<OscPacket> {
    if depth > MAX_BUNDLE_DEPTH {
        return Err(Error::MalformedBundleElement(
            "bundle nesting too deep".to_string(),
        ));
    }

    if is_bundle(bytes) {
        Ok(OscPacket::Bundle(decode_bundle_at(bytes, depth)?))
    } else {
        Ok(OscPacket::Message(decode_message(bytes)?))
    }
}

fn decode_bundle_at(bytes: &[u8], depth: usize) -> Result<OscBundle> {
    if bytes.len() < BUNDLE_HEADER_SIZE {
        return Err(Error::TruncatedBuffer {
            needed: BUNDLE_HEADER_SIZE,
            have: bytes.len(),
        });
    }
    if !is_bundle(bytes) {
        return Err(Error::MalformedBundleElement(
            "missing #bundle marker".to_string(),
        ));
    }

    let mut header = &bytes[BUNDLE_TAG.len()..BUNDLE_HEADER_SIZE];
    let seconds = header.get_u32();
    let fraction = header.get_u32();
    let timetag = OscTimeTag::from_ntp(seconds, fraction);

    let mut elements = Vec::new();
    let mut pos = BUNDLE_HEADER_SIZE;

    while bytes.len() - pos >= 4 && elements.len() < MAX_BUNDLE_ELEMENTS {
        let mut prefix = &bytes[pos..pos + 4];
        let size = prefix.get_u32() as usize;

        // Zero or overrunning size: stop here, keep what decoded cleanly
        if size == 0 || size > bytes.len() - pos - 4 {
            break;
        }

        match decode_packet_at(&bytes[pos + 4..pos + 4 + size], depth + 1) {
            Ok(element) => elements.push(element),
            Err(_) => break,
        }

        pos += 4 + size;
    }

    Ok(OscBundle { timetag, elements })
}

/// Decode one argument at `pos`, returning the value and bytes consumed
fn decode_arg(bytes: &[u8], pos: usize, tag_byte: u8) -> Result<(OscValue, usize)> {
    match tag_byte {
        tag::INT32 => {
            need(bytes, pos, 4)?;
            let mut field = &bytes[pos..pos + 4];
            Ok((OscValue::Int32(field.get_i32()), 4))
        }
        tag::FLOAT32 => {
            need(bytes, pos, 4)?;
            let mut field = &bytes[pos..pos + 4];
            Ok((OscValue::Float32(field.get_f32()), 4))
        }
        tag::STRING => {
            need(bytes, pos, 1)?;
            let (s, next) = read_padded_str(bytes, pos);
            Ok((OscValue::Str(s), next - pos))
        }
        tag::TRUE => Ok((OscValue::Bool(true), 0)),
        tag::FALSE => Ok((OscValue::Bool(false), 0)),
        tag::NIL => Ok((OscValue::Nil, 0)),
        tag::BLOB => {
            need(bytes, pos, 4)?;
            let mut prefix = &bytes[pos..pos + 4];
            let len = prefix.get_u32() as usize;
            need(bytes, pos + 4, len)?;
            let data = bytes[pos + 4..pos + 4 + len].to_vec();
            // Trailing padding may be clipped; consume what is there
            let consumed = (4 + len + 3) / 4 * 4;
            Ok((OscValue::Blob(data), consumed.min(bytes.len() - pos)))
        }
        other => Err(Error::UnsupportedTag(other as char)),
    }
}

/// Read an OSC-string starting at `pos`: bytes up to the first NUL, cursor
/// advanced past the 4-byte-aligned padding. A missing terminator consumes
/// the rest of the buffer (clipped datagrams are tolerated, not rejected).
fn read_padded_str(bytes: &[u8], pos: usize) -> (String, usize) {
    let rest = &bytes[pos..];
    match rest.iter().position(|&b| b == 0) {
        Some(len) => {
            let s = String::from_utf8_lossy(&rest[..len]).into_owned();
            let advance = (len / 4 + 1) * 4;
            (s, (pos + advance).min(bytes.len()))
        }
        None => (
            String::from_utf8_lossy(rest).into_owned(),
            bytes.len(),
        ),
    }
}

/// Bounds check for a fixed-size field at `pos`
fn need(bytes: &[u8], pos: usize, len: usize) -> Result<()> {
    if bytes.len() < pos + len {
        return Err(Error::TruncatedBuffer {
            needed: pos + len,
            have: bytes.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_str_alignment() {
        // String lengths 0..8 all pad to a multiple of 4, minimum 4
        for len in 0..8 {
            let s = "x".repeat(len);
            let mut buf = BytesMut::new();
            put_padded_str(&mut buf, &s);
            assert_eq!(buf.len() % 4, 0, "len {}", len);
            assert!(buf.len() >= 4);
            assert!(buf.len() > len, "NUL terminator must fit");
        }
    }

    #[test]
    fn test_padded_str_roundtrip() {
        let mut buf = BytesMut::new();
        put_padded_str(&mut buf, "/synth");
        put_padded_str(&mut buf, "abc");

        let (first, pos) = read_padded_str(&buf, 0);
        assert_eq!(first, "/synth");
        assert_eq!(pos, 8);

        let (second, pos) = read_padded_str(&buf, pos);
        assert_eq!(second, "abc");
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn test_unknown_tag_skips_four_bytes() {
        // Tags declare an unknown 'q' before an int; the decoder must hop
        // over exactly 4 bytes and still recover the int.
        let mut buf = BytesMut::new();
        put_padded_str(&mut buf, "/legacy");
        put_padded_str(&mut buf, ",qi");
        buf.put_u32(0xDEAD_BEEF); // opaque 4-byte payload for 'q'
        buf.put_i32(7);

        let msg = decode_message(&buf).unwrap();
        assert_eq!(msg.args, vec![OscValue::Int32(7)]);
    }

    #[test]
    fn test_unknown_tag_at_buffer_end() {
        let mut buf = BytesMut::new();
        put_padded_str(&mut buf, "/legacy");
        put_padded_str(&mut buf, ",q");

        let msg = decode_message(&buf).unwrap();
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_missing_tag_string_means_no_args() {
        let mut buf = BytesMut::new();
        put_padded_str(&mut buf, "/bare");

        let msg = decode_message(&buf).unwrap();
        assert_eq!(msg.address, "/bare");
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_blob_padding() {
        for len in [0usize, 1, 3, 4, 5] {
            let msg = OscMessage::new("/blob").arg(OscValue::Blob(vec![0xAB; len]));
            let encoded = encode_message(&msg).unwrap();
            assert_eq!(encoded.len() % 4, 0, "blob len {}", len);

            let decoded = decode_message(&encoded).unwrap();
            assert_eq!(decoded, msg);
        }
    }

    #[test]
    fn test_encode_rejects_bad_address() {
        for addr in ["", "synth/freq"] {
            let err = encode_message(&OscMessage::new(addr)).unwrap_err();
            assert!(matches!(err, Error::InvalidAddress(_)));
        }
    }

    #[test]
    fn test_decode_accepts_bad_address() {
        let mut buf = BytesMut::new();
        put_padded_str(&mut buf, "no-slash");
        put_padded_str(&mut buf, ",");

        let msg = decode_message(&buf).unwrap();
        assert_eq!(msg.address, "no-slash");
    }

    #[test]
    fn test_bundle_depth_guard() {
        // Wrap a message in more bundles than the decoder will follow
        let mut packet = OscPacket::Message(OscMessage::new("/deep"));
        for _ in 0..(MAX_BUNDLE_DEPTH + 4) {
            packet = OscPacket::Bundle(OscBundle::immediate(vec![packet]));
        }
        let encoded = encode(&packet).unwrap();

        // Decode terminates and returns a truncated tree instead of recursing
        let decoded = decode(&encoded).unwrap();
        let mut depth = 0;
        let mut cursor = &decoded;
        while let OscPacket::Bundle(b) = cursor {
            depth += 1;
            match b.elements.first() {
                Some(inner) => cursor = inner,
                None => break,
            }
        }
        assert!(depth <= MAX_BUNDLE_DEPTH + 1);
    }

    #[test]
    fn test_bundle_element_ceiling() {
        let elements: Vec<OscPacket> = (0..MAX_BUNDLE_ELEMENTS + 20)
            .map(|i| OscPacket::Message(OscMessage::new("/n").arg(i as i32)))
            .collect();
        let encoded = encode_bundle(&OscBundle::immediate(elements)).unwrap();

        let decoded = decode_bundle(&encoded).unwrap();
        assert_eq!(decoded.elements.len(), MAX_BUNDLE_ELEMENTS);
    }
}
