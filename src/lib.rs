//! btcwire - message framing for the bitcoin peer-to-peer wire protocol
//!
//! This library turns a byte stream into validated, typed protocol messages
//! and back. It is the layer that touches untrusted network bytes, so every
//! header is checked before any payload-sized allocation happens.
//!
//! # Quick Start
//!
//! ```rust
//! use std::io::Cursor;
//! use btcwire::{Message, NetworkId, PROTOCOL_VERSION, read_message, write_message};
//! use btcwire::message::MsgPing;
//!
//! let mut wire = Vec::new();
//! write_message(&mut wire, &MsgPing::new(7), PROTOCOL_VERSION, NetworkId::MAIN_NET)?;
//!
//! let mut reader = Cursor::new(wire);
//! let (msg, _payload) = read_message(&mut reader, PROTOCOL_VERSION, NetworkId::MAIN_NET)?;
//! assert_eq!(msg, Message::Ping(MsgPing::new(7)));
//! # Ok::<(), btcwire::Error>(())
//! ```
//!
//! # Features
//!
//! - **Bounded reads** - global and per-message payload caps enforced before allocation
//! - **Resynchronisation** - rejected payloads are drained in fixed-size chunks
//! - **Structured errors** - every failure reports bytes consumed and the offending values
//! - **Checksums** - double SHA-256 prefix verified on every payload

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;

pub use protocol::{
    BodyError, COMMAND_SIZE, Codec, CodecConfig, Command, Error, HEADER_SIZE, MAX_MESSAGE_PAYLOAD,
    Message, MessageHeader, NetworkId, PROTOCOL_VERSION, Payload, ReadError, Result, ShaHash,
    WriteError, drain, message, read_message, read_message_n, write_message, write_message_n,
};
