//! OSC data model
//!
//! Value types are explicit tagged variants constructed by the caller, so
//! the codec never has to guess between integer/float or string/boolean the
//! way dynamically-typed OSC senders do. All of these are plain value types:
//! built per call, dropped when the caller is done, no I/O and no cross-call
//! state.

use crate::time::OscTimeTag;
use serde::{Deserialize, Serialize};

/// A single OSC argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OscValue {
    Nil,
    Bool(bool),
    Int32(i32),
    Float32(f32),
    Str(String),
    Blob(Vec<u8>),
}

impl OscValue {
    /// The OSC type tag character for this value
    ///
    /// Every variant has exactly one tag; booleans split into `T`/`F`
    /// because the tag alone carries the value on the wire.
    pub fn type_tag(&self) -> char {
        match self {
            OscValue::Int32(_) => 'i',
            OscValue::Float32(_) => 'f',
            OscValue::Str(_) => 's',
            OscValue::Bool(true) => 'T',
            OscValue::Bool(false) => 'F',
            OscValue::Nil => 'N',
            OscValue::Blob(_) => 'b',
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            OscValue::Int32(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            OscValue::Float32(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OscValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OscValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            OscValue::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl From<i32> for OscValue {
    fn from(v: i32) -> Self {
        OscValue::Int32(v)
    }
}

impl From<f32> for OscValue {
    fn from(v: f32) -> Self {
        OscValue::Float32(v)
    }
}

impl From<bool> for OscValue {
    fn from(v: bool) -> Self {
        OscValue::Bool(v)
    }
}

impl From<String> for OscValue {
    fn from(v: String) -> Self {
        OscValue::Str(v)
    }
}

impl From<&str> for OscValue {
    fn from(v: &str) -> Self {
        OscValue::Str(v.to_string())
    }
}

impl From<Vec<u8>> for OscValue {
    fn from(v: Vec<u8>) -> Self {
        OscValue::Blob(v)
    }
}

/// A single OSC message: address pattern plus ordered arguments
///
/// The address must be non-empty and start with `/`. That is enforced at
/// the encode boundary only — the decoder accepts whatever address bytes a
/// legacy sender put on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscMessage {
    pub address: String,
    #[serde(default)]
    pub args: Vec<OscValue>,
}

impl OscMessage {
    /// Create a message with no arguments
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    /// Create a message with arguments
    pub fn with_args(address: impl Into<String>, args: Vec<OscValue>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// Append an argument (builder style)
    pub fn arg(mut self, value: impl Into<OscValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Canonical type-tag string: `,` followed by one tag per argument
    pub fn type_tags(&self) -> String {
        let mut tags = String::with_capacity(self.args.len() + 1);
        tags.push(',');
        for arg in &self.args {
            tags.push(arg.type_tag());
        }
        tags
    }
}

/// An OSC bundle: execution timetag plus ordered elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscBundle {
    pub timetag: OscTimeTag,
    pub elements: Vec<OscPacket>,
}

impl OscBundle {
    /// Create a bundle executing immediately
    pub fn immediate(elements: Vec<OscPacket>) -> Self {
        Self {
            timetag: OscTimeTag::Immediate,
            elements,
        }
    }
}

/// One decodable unit of OSC traffic: a message or a (recursive) bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OscPacket {
    Message(OscMessage),
    Bundle(OscBundle),
}

impl OscPacket {
    pub fn as_message(&self) -> Option<&OscMessage> {
        match self {
            OscPacket::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_bundle(&self) -> Option<&OscBundle> {
        match self {
            OscPacket::Bundle(b) => Some(b),
            _ => None,
        }
    }
}

impl From<OscMessage> for OscPacket {
    fn from(m: OscMessage) -> Self {
        OscPacket::Message(m)
    }
}

impl From<OscBundle> for OscPacket {
    fn from(b: OscBundle) -> Self {
        OscPacket::Bundle(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_mapping() {
        assert_eq!(OscValue::Int32(1).type_tag(), 'i');
        assert_eq!(OscValue::Float32(1.0).type_tag(), 'f');
        assert_eq!(OscValue::Str("x".to_string()).type_tag(), 's');
        assert_eq!(OscValue::Bool(true).type_tag(), 'T');
        assert_eq!(OscValue::Bool(false).type_tag(), 'F');
        assert_eq!(OscValue::Nil.type_tag(), 'N');
        assert_eq!(OscValue::Blob(vec![0]).type_tag(), 'b');
    }

    #[test]
    fn test_type_tag_string() {
        let msg = OscMessage::new("/mix/level")
            .arg(3i32)
            .arg(0.5f32)
            .arg("main")
            .arg(true)
            .arg(OscValue::Nil);
        assert_eq!(msg.type_tags(), ",ifsTN");
    }

    #[test]
    fn test_empty_type_tag_string() {
        assert_eq!(OscMessage::new("/trigger").type_tags(), ",");
    }
}
