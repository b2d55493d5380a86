//! Block headers, blocks, and chain sync requests

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::tx::{MAX_BLOCK_PAYLOAD, MsgTx};
use super::{Command, Payload};
use crate::protocol::wire::{
    MAX_VAR_INT_PAYLOAD, check_count, get_count, get_hash, get_i32, get_u32, get_var_int,
    put_hash, put_var_int,
};
use crate::protocol::{BodyError, BodyResult, HASH_SIZE, ShaHash};

/// Encoded size of a block header
pub const MAX_BLOCK_HEADER_PAYLOAD: u32 = 16 + 2 * HASH_SIZE as u32;

/// Most locator hashes a getblocks/getheaders message may carry
pub const MAX_BLOCK_LOCATORS_PER_MSG: u32 = 500;

/// Most headers a single headers message may carry
pub const MAX_BLOCK_HEADERS_PER_MSG: u32 = 2000;

// Smallest transaction: version, two empty counts, lock time.
const MIN_TX_PAYLOAD: u32 = 10;
const MAX_TX_PER_BLOCK: u64 = (MAX_BLOCK_PAYLOAD / MIN_TX_PAYLOAD) as u64 + 1;

/// Block header (80 bytes on the wire)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BlockHeader {
    /// Block format version
    pub version: i32,
    /// Hash of the previous block
    pub prev_block: ShaHash,
    /// Merkle root of the block's transactions
    pub merkle_root: ShaHash,
    /// Block time (unix seconds)
    pub timestamp: u32,
    /// Compact difficulty target
    pub bits: u32,
    /// Proof-of-work nonce
    pub nonce: u32,
}

impl BlockHeader {
    /// Hash identifying the block
    #[must_use]
    pub fn block_hash(&self) -> ShaHash {
        let mut buf = BytesMut::with_capacity(MAX_BLOCK_HEADER_PAYLOAD as usize);
        self.write_to(&mut buf);
        ShaHash::digest(&buf)
    }

    fn read_from<B: Buf>(buf: &mut B) -> BodyResult<Self> {
        Ok(Self {
            version: get_i32(buf, "block version")?,
            prev_block: get_hash(buf, "previous block")?,
            merkle_root: get_hash(buf, "merkle root")?,
            timestamp: get_u32(buf, "block timestamp")?,
            bits: get_u32(buf, "bits")?,
            nonce: get_u32(buf, "block nonce")?,
        })
    }

    fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_i32_le(self.version);
        put_hash(buf, &self.prev_block);
        put_hash(buf, &self.merkle_root);
        buf.put_u32_le(self.timestamp);
        buf.put_u32_le(self.bits);
        buf.put_u32_le(self.nonce);
    }
}

/// Full block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsgBlock {
    /// Block header
    pub header: BlockHeader,
    /// Transactions, coinbase first
    pub transactions: Vec<MsgTx>,
}

impl Payload for MsgBlock {
    fn decode(&mut self, buf: &mut Bytes, _pver: u32) -> BodyResult<()> {
        self.header = BlockHeader::read_from(buf)?;

        let count = get_count(buf, self.command(), "transactions", MAX_TX_PER_BLOCK)?;
        self.transactions =
            Vec::with_capacity(count.min(buf.remaining() / MIN_TX_PAYLOAD as usize));
        for _ in 0..count {
            self.transactions.push(MsgTx::read_from(buf)?);
        }
        Ok(())
    }

    fn encode(&self, buf: &mut BytesMut, _pver: u32) -> BodyResult<()> {
        let count = self.transactions.len() as u64;
        check_count(self.command(), "transactions", count, MAX_TX_PER_BLOCK)?;

        self.header.write_to(buf);
        put_var_int(buf, count);
        for tx in &self.transactions {
            tx.check_counts()?;
            tx.write_to(buf);
        }
        Ok(())
    }

    fn command(&self) -> &'static str {
        Command::Block.as_str()
    }

    fn max_payload_length(&self, _pver: u32) -> u32 {
        MAX_BLOCK_PAYLOAD
    }
}

macro_rules! locator_message {
    ($(#[$doc:meta])* $name:ident => $command:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            /// Protocol version of the requester
            pub protocol_version: u32,
            /// Known block hashes, newest first
            pub block_locator_hashes: Vec<ShaHash>,
            /// Last hash wanted; zero for as many as allowed
            pub hash_stop: ShaHash,
        }

        impl $name {
            /// Create a request ending at `hash_stop`
            #[must_use]
            pub const fn new(protocol_version: u32, hash_stop: ShaHash) -> Self {
                Self {
                    protocol_version,
                    block_locator_hashes: Vec::new(),
                    hash_stop,
                }
            }
        }

        impl Payload for $name {
            fn decode(&mut self, buf: &mut Bytes, _pver: u32) -> BodyResult<()> {
                self.protocol_version = get_u32(buf, "protocol version")?;

                let count = get_count(
                    buf,
                    self.command(),
                    "locator hashes",
                    u64::from(MAX_BLOCK_LOCATORS_PER_MSG),
                )?;
                self.block_locator_hashes = Vec::with_capacity(count);
                for _ in 0..count {
                    self.block_locator_hashes.push(get_hash(buf, "locator hash")?);
                }

                self.hash_stop = get_hash(buf, "hash stop")?;
                Ok(())
            }

            fn encode(&self, buf: &mut BytesMut, _pver: u32) -> BodyResult<()> {
                let count = self.block_locator_hashes.len() as u64;
                check_count(
                    self.command(),
                    "locator hashes",
                    count,
                    u64::from(MAX_BLOCK_LOCATORS_PER_MSG),
                )?;

                buf.put_u32_le(self.protocol_version);
                put_var_int(buf, count);
                for hash in &self.block_locator_hashes {
                    put_hash(buf, hash);
                }
                put_hash(buf, &self.hash_stop);
                Ok(())
            }

            fn command(&self) -> &'static str {
                Command::$command.as_str()
            }

            fn max_payload_length(&self, _pver: u32) -> u32 {
                4 + MAX_VAR_INT_PAYLOAD
                    + MAX_BLOCK_LOCATORS_PER_MSG * HASH_SIZE as u32
                    + HASH_SIZE as u32
            }
        }
    };
}

locator_message!(
    /// Requests an inv of blocks following the locator
    MsgGetBlocks => GetBlocks
);

locator_message!(
    /// Requests headers of blocks following the locator
    MsgGetHeaders => GetHeaders
);

/// Block headers answering a getheaders request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsgHeaders {
    /// Headers in chain order
    pub headers: Vec<BlockHeader>,
}

impl MsgHeaders {
    /// Create the message from a list of headers
    #[must_use]
    pub const fn new(headers: Vec<BlockHeader>) -> Self {
        Self { headers }
    }
}

impl Payload for MsgHeaders {
    fn decode(&mut self, buf: &mut Bytes, _pver: u32) -> BodyResult<()> {
        let count = get_count(
            buf,
            self.command(),
            "headers",
            u64::from(MAX_BLOCK_HEADERS_PER_MSG),
        )?;

        self.headers = Vec::with_capacity(count);
        for _ in 0..count {
            let header = BlockHeader::read_from(buf)?;
            // Each header is followed by a transaction count that must be zero.
            if get_var_int(buf)? != 0 {
                return Err(BodyError::Invalid {
                    field: "header transaction count",
                    reason: "block headers may not contain transactions",
                });
            }
            self.headers.push(header);
        }
        Ok(())
    }

    fn encode(&self, buf: &mut BytesMut, _pver: u32) -> BodyResult<()> {
        let count = self.headers.len() as u64;
        check_count(
            self.command(),
            "headers",
            count,
            u64::from(MAX_BLOCK_HEADERS_PER_MSG),
        )?;

        put_var_int(buf, count);
        for header in &self.headers {
            header.write_to(buf);
            put_var_int(buf, 0);
        }
        Ok(())
    }

    fn command(&self) -> &'static str {
        Command::Headers.as_str()
    }

    fn max_payload_length(&self, _pver: u32) -> u32 {
        MAX_VAR_INT_PAYLOAD + MAX_BLOCK_HEADERS_PER_MSG * (MAX_BLOCK_HEADER_PAYLOAD + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PROTOCOL_VERSION;

    fn genesis_header() -> BlockHeader {
        let mut merkle = [0u8; HASH_SIZE];
        hex_to_reversed(
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
            &mut merkle,
        );
        BlockHeader {
            version: 1,
            prev_block: ShaHash::default(),
            merkle_root: ShaHash::new(merkle),
            timestamp: 1_231_006_505,
            bits: 0x1D00_FFFF,
            nonce: 2_083_236_893,
        }
    }

    fn hex_to_reversed(text: &str, out: &mut [u8; HASH_SIZE]) {
        let decoded = hex::decode(text).unwrap();
        for (i, byte) in decoded.iter().rev().enumerate() {
            out[i] = *byte;
        }
    }

    #[test]
    fn test_genesis_block_hash() {
        assert_eq!(
            genesis_header().block_hash().to_string(),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
    }

    #[test]
    fn test_headers_roundtrip() {
        let msg = MsgHeaders::new(vec![genesis_header(); 3]);
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, PROTOCOL_VERSION).unwrap();
        assert_eq!(buf.len(), 1 + 3 * (MAX_BLOCK_HEADER_PAYLOAD as usize + 1));

        let mut decoded = MsgHeaders::default();
        decoded.decode(&mut buf.freeze(), PROTOCOL_VERSION).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_headers_reject_transactions() {
        let mut buf = BytesMut::new();
        put_var_int(&mut buf, 1);
        genesis_header().write_to(&mut buf);
        put_var_int(&mut buf, 1);

        let mut decoded = MsgHeaders::default();
        assert!(matches!(
            decoded.decode(&mut buf.freeze(), PROTOCOL_VERSION),
            Err(BodyError::Invalid { .. })
        ));
    }

    #[test]
    fn test_getblocks_roundtrip_and_limit() {
        let mut msg = MsgGetBlocks::new(PROTOCOL_VERSION, ShaHash::default());
        msg.block_locator_hashes = vec![ShaHash::digest(b"a"), ShaHash::digest(b"b")];
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, PROTOCOL_VERSION).unwrap();

        let mut decoded = MsgGetBlocks::default();
        decoded.decode(&mut buf.freeze(), PROTOCOL_VERSION).unwrap();
        assert_eq!(decoded, msg);

        msg.block_locator_hashes =
            vec![ShaHash::default(); MAX_BLOCK_LOCATORS_PER_MSG as usize + 1];
        let mut buf = BytesMut::new();
        assert!(matches!(
            msg.encode(&mut buf, PROTOCOL_VERSION),
            Err(BodyError::TooManyItems { command: "getblocks", .. })
        ));
    }

    #[test]
    fn test_block_roundtrip() {
        let coinbase = MsgTx {
            version: 1,
            tx_in: Vec::new(),
            tx_out: Vec::new(),
            lock_time: 0,
        };
        let block = MsgBlock {
            header: genesis_header(),
            transactions: vec![coinbase.clone(), coinbase],
        };
        let mut buf = BytesMut::new();
        block.encode(&mut buf, PROTOCOL_VERSION).unwrap();
        assert_eq!(
            buf.len(),
            MAX_BLOCK_HEADER_PAYLOAD as usize + 1 + 2 * MIN_TX_PAYLOAD as usize
        );

        let mut decoded = MsgBlock::default();
        decoded.decode(&mut buf.freeze(), PROTOCOL_VERSION).unwrap();
        assert_eq!(decoded, block);
    }
}
