//! Transactions

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Command, Payload};
use crate::protocol::wire::{
    check_count, get_count, get_hash, get_i32, get_i64, get_u32, get_var_bytes, put_hash,
    put_var_bytes, put_var_int,
};
use crate::protocol::{BodyResult, HASH_SIZE, MAX_MESSAGE_PAYLOAD, ShaHash};

/// Largest block, and therefore largest transaction, in bytes
pub const MAX_BLOCK_PAYLOAD: u32 = 1_000_000;

// outpoint (36) + empty script length (1) + sequence (4)
const MIN_TX_IN_PAYLOAD: u32 = HASH_SIZE as u32 + 4 + 1 + 4;
// value (8) + empty script length (1)
const MIN_TX_OUT_PAYLOAD: u32 = 9;

const MAX_TX_IN_PER_MESSAGE: u64 = (MAX_BLOCK_PAYLOAD / MIN_TX_IN_PAYLOAD) as u64 + 1;
const MAX_TX_OUT_PER_MESSAGE: u64 = (MAX_BLOCK_PAYLOAD / MIN_TX_OUT_PAYLOAD) as u64 + 1;

/// Reference to an output of a previous transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Hash of the transaction holding the output
    pub hash: ShaHash,
    /// Output index within that transaction
    pub index: u32,
}

/// Transaction input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxIn {
    /// Output being spent
    pub previous_out_point: OutPoint,
    /// Script satisfying the spent output
    pub signature_script: Bytes,
    /// Input sequence number
    pub sequence: u32,
}

/// Transaction output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxOut {
    /// Amount in satoshi
    pub value: i64,
    /// Script locking the output
    pub pk_script: Bytes,
}

/// Bitcoin transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsgTx {
    /// Transaction format version
    pub version: i32,
    /// Inputs
    pub tx_in: Vec<TxIn>,
    /// Outputs
    pub tx_out: Vec<TxOut>,
    /// Earliest block or time the transaction may be mined
    pub lock_time: u32,
}

impl MsgTx {
    /// Hash identifying this transaction
    #[must_use]
    pub fn tx_hash(&self) -> ShaHash {
        let mut buf = BytesMut::new();
        self.write_to(&mut buf);
        ShaHash::digest(&buf)
    }

    pub(crate) fn read_from(buf: &mut Bytes) -> BodyResult<Self> {
        let command = Command::Tx.as_str();
        let version = get_i32(buf, "tx version")?;

        // Counts are capped, and capacity is bounded by what the payload
        // could actually hold.
        let in_count = get_count(buf, command, "inputs", MAX_TX_IN_PER_MESSAGE)?;
        let mut tx_in =
            Vec::with_capacity(in_count.min(buf.remaining() / MIN_TX_IN_PAYLOAD as usize));
        for _ in 0..in_count {
            let hash = get_hash(buf, "previous outpoint hash")?;
            let index = get_u32(buf, "previous outpoint index")?;
            let signature_script = get_var_bytes(buf, MAX_MESSAGE_PAYLOAD, "signature script")?;
            let sequence = get_u32(buf, "sequence")?;
            tx_in.push(TxIn {
                previous_out_point: OutPoint { hash, index },
                signature_script,
                sequence,
            });
        }

        let out_count = get_count(buf, command, "outputs", MAX_TX_OUT_PER_MESSAGE)?;
        let mut tx_out =
            Vec::with_capacity(out_count.min(buf.remaining() / MIN_TX_OUT_PAYLOAD as usize));
        for _ in 0..out_count {
            let value = get_i64(buf, "output value")?;
            let pk_script = get_var_bytes(buf, MAX_MESSAGE_PAYLOAD, "pk script")?;
            tx_out.push(TxOut { value, pk_script });
        }

        let lock_time = get_u32(buf, "lock time")?;

        Ok(Self {
            version,
            tx_in,
            tx_out,
            lock_time,
        })
    }

    pub(crate) fn write_to(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.version);

        put_var_int(buf, self.tx_in.len() as u64);
        for input in &self.tx_in {
            put_hash(buf, &input.previous_out_point.hash);
            buf.put_u32_le(input.previous_out_point.index);
            put_var_bytes(buf, &input.signature_script);
            buf.put_u32_le(input.sequence);
        }

        put_var_int(buf, self.tx_out.len() as u64);
        for output in &self.tx_out {
            buf.put_i64_le(output.value);
            put_var_bytes(buf, &output.pk_script);
        }

        buf.put_u32_le(self.lock_time);
    }

    pub(crate) fn check_counts(&self) -> BodyResult<()> {
        let command = Command::Tx.as_str();
        check_count(command, "inputs", self.tx_in.len() as u64, MAX_TX_IN_PER_MESSAGE)?;
        check_count(command, "outputs", self.tx_out.len() as u64, MAX_TX_OUT_PER_MESSAGE)
    }
}

impl Payload for MsgTx {
    fn decode(&mut self, buf: &mut Bytes, _pver: u32) -> BodyResult<()> {
        *self = Self::read_from(buf)?;
        Ok(())
    }

    fn encode(&self, buf: &mut BytesMut, _pver: u32) -> BodyResult<()> {
        self.check_counts()?;
        self.write_to(buf);
        Ok(())
    }

    fn command(&self) -> &'static str {
        Command::Tx.as_str()
    }

    fn max_payload_length(&self, _pver: u32) -> u32 {
        MAX_BLOCK_PAYLOAD
    }
}
