//! Bitcoin wire protocol framing
//!
//! This module provides the message header, the message variants, and the
//! read/write pipelines that move typed messages across a byte stream.

mod codec;
mod config;
mod drain;
mod error;
mod header;
pub mod message;
mod types;
pub mod wire;

use sha2::{Digest, Sha256};

pub use codec::{read_message, read_message_n, write_message, write_message_n};
pub use config::{Codec, CodecConfig};
pub use drain::drain;
pub use error::{BodyError, BodyResult, Error, ReadError, Result, WriteError};
pub use header::MessageHeader;
pub use message::{Command, Message, Payload};
pub use types::{HASH_SIZE, NetworkId, ShaHash};

/// Header size in bytes: magic (4) + command (12) + length (4) + checksum (4)
pub const HEADER_SIZE: usize = 24;

/// Width of the zero-padded command field
pub const COMMAND_SIZE: usize = 12;

/// Checksum prefix size in bytes
pub const CHECKSUM_SIZE: usize = 4;

/// Maximum payload size of any message (32 MB)
pub const MAX_MESSAGE_PAYLOAD: u32 = 32 * 1024 * 1024;

/// Chunk size used when discarding rejected payloads (10 KB)
pub const DRAIN_CHUNK_SIZE: usize = 10 * 1024;

/// Latest protocol version
pub const PROTOCOL_VERSION: u32 = 70001;

/// Version that allows more than one address per addr message
pub const MULTIPLE_ADDRESS_VERSION: u32 = 209;

/// Version that added a timestamp to network addresses
pub const NET_ADDRESS_TIME_VERSION: u32 = 31402;

/// Version after which ping carries a nonce and pong exists (BIP0031)
pub const BIP0031_VERSION: u32 = 60000;

/// Version that added the mempool message (BIP0035)
pub const BIP0035_VERSION: u32 = 60002;

/// SHA-256 applied twice
#[must_use]
pub fn double_sha256(data: &[u8]) -> [u8; HASH_SIZE] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// First four bytes of the double SHA-256 of `payload`
#[must_use]
pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let digest = double_sha256(payload);
    [digest[0], digest[1], digest[2], digest[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_checksum() {
        // Well-known checksum of an empty payload (verack, getaddr).
        assert_eq!(checksum(&[]), [0x5D, 0xF6, 0xE0, 0xE2]);
    }

    #[test]
    fn test_double_sha256_differs_from_single() {
        let single: [u8; HASH_SIZE] = Sha256::digest(b"hello").into();
        assert_ne!(double_sha256(b"hello"), single);
    }
}
