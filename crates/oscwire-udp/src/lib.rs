//! oscwire UDP transport
//!
//! Thin UDP plumbing around [`oscwire_core`]: bind a socket, hand it typed
//! [`oscwire_core::OscPacket`] values to send, and get decoded packets back
//! on a channel. All suspension, backpressure, and socket policy lives here;
//! the codec underneath stays pure and synchronous.

pub mod endpoint;
pub mod error;

pub use endpoint::{OscEndpoint, OscReceiver, UdpConfig};
pub use error::{Result, TransportError};
