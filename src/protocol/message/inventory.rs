//! Inventory vectors and the messages that carry them

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Command, Payload};
use crate::protocol::wire::{
    MAX_VAR_INT_PAYLOAD, check_count, get_count, get_hash, get_u32, put_hash, put_var_int,
    var_int_size,
};
use crate::protocol::{BodyResult, HASH_SIZE, ShaHash};

/// Most inventory vectors a single message may carry
pub const MAX_INV_PER_MSG: u32 = 50_000;

// type (4) + hash (32)
const MAX_INV_VECT_PAYLOAD: u32 = 4 + HASH_SIZE as u32;

/// Kind of object an inventory vector refers to
///
/// Unknown values are kept as-is so they survive a decode/encode cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InvType(u32);

impl InvType {
    /// Error or ignorable entry
    pub const ERROR: Self = Self(0);
    /// Transaction
    pub const TX: Self = Self(1);
    /// Block
    pub const BLOCK: Self = Self(2);

    /// Wrap a raw type value
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw type value
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for InvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ERROR => write!(f, "ERROR"),
            Self::TX => write!(f, "MSG_TX"),
            Self::BLOCK => write!(f, "MSG_BLOCK"),
            Self(other) => write!(f, "Unknown InvType ({other})"),
        }
    }
}

/// Reference to a block or transaction by hash
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InvVect {
    /// What the hash refers to
    pub inv_type: InvType,
    /// Hash of the object
    pub hash: ShaHash,
}

impl InvVect {
    /// Create an inventory vector
    #[must_use]
    pub const fn new(inv_type: InvType, hash: ShaHash) -> Self {
        Self { inv_type, hash }
    }
}

fn decode_inv_list(buf: &mut Bytes, command: &'static str) -> BodyResult<Vec<InvVect>> {
    let count = get_count(buf, command, "inventory vectors", u64::from(MAX_INV_PER_MSG))?;

    // A forged count must not size the allocation beyond what the payload holds.
    let mut list =
        Vec::with_capacity(count.min(buf.remaining() / MAX_INV_VECT_PAYLOAD as usize));
    for _ in 0..count {
        let inv_type = InvType::new(get_u32(buf, "inventory type")?);
        let hash = get_hash(buf, "inventory hash")?;
        list.push(InvVect::new(inv_type, hash));
    }
    Ok(list)
}

fn encode_inv_list(buf: &mut BytesMut, command: &'static str, list: &[InvVect]) -> BodyResult<()> {
    let count = list.len() as u64;
    check_count(command, "inventory vectors", count, u64::from(MAX_INV_PER_MSG))?;

    buf.reserve(var_int_size(count) + list.len() * MAX_INV_VECT_PAYLOAD as usize);
    put_var_int(buf, count);
    for inv in list {
        buf.put_u32_le(inv.inv_type.as_u32());
        put_hash(buf, &inv.hash);
    }
    Ok(())
}

macro_rules! inventory_message {
    ($(#[$doc:meta])* $name:ident => $command:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            /// Inventory vectors
            pub inv_list: Vec<InvVect>,
        }

        impl $name {
            /// Create the message from a list of inventory vectors
            #[must_use]
            pub const fn new(inv_list: Vec<InvVect>) -> Self {
                Self { inv_list }
            }
        }

        impl Payload for $name {
            fn decode(&mut self, buf: &mut Bytes, _pver: u32) -> BodyResult<()> {
                self.inv_list = decode_inv_list(buf, self.command())?;
                Ok(())
            }

            fn encode(&self, buf: &mut BytesMut, _pver: u32) -> BodyResult<()> {
                encode_inv_list(buf, self.command(), &self.inv_list)
            }

            fn command(&self) -> &'static str {
                Command::$command.as_str()
            }

            fn max_payload_length(&self, _pver: u32) -> u32 {
                MAX_VAR_INT_PAYLOAD + MAX_INV_PER_MSG * MAX_INV_VECT_PAYLOAD
            }
        }
    };
}

inventory_message!(
    /// Announces known blocks or transactions
    MsgInv => Inv
);

inventory_message!(
    /// Requests blocks or transactions
    MsgGetData => GetData
);

inventory_message!(
    /// Reports requested objects that are not available
    MsgNotFound => NotFound
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{BodyError, PROTOCOL_VERSION};

    #[test]
    fn test_inv_roundtrip_keeps_unknown_types() {
        let msg = MsgInv::new(vec![
            InvVect::new(InvType::TX, ShaHash::digest(b"tx")),
            InvVect::new(InvType::new(0x4000_0002), ShaHash::digest(b"witness")),
        ]);
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, PROTOCOL_VERSION).unwrap();
        assert_eq!(buf.len(), 1 + 2 * MAX_INV_VECT_PAYLOAD as usize);

        let mut decoded = MsgInv::default();
        decoded.decode(&mut buf.freeze(), PROTOCOL_VERSION).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_inv_count_over_limit() {
        let mut buf = BytesMut::new();
        put_var_int(&mut buf, u64::from(MAX_INV_PER_MSG) + 1);
        let mut decoded = MsgGetData::default();
        assert!(matches!(
            decoded.decode(&mut buf.freeze(), PROTOCOL_VERSION),
            Err(BodyError::TooManyItems { command: "getdata", .. })
        ));
    }

    #[test]
    fn test_inv_forged_count_is_truncated() {
        // Declares the maximum count but carries a single vector.
        let mut buf = BytesMut::new();
        put_var_int(&mut buf, u64::from(MAX_INV_PER_MSG));
        buf.put_u32_le(InvType::BLOCK.as_u32());
        put_hash(&mut buf, &ShaHash::digest(b"only"));

        let mut payload = buf.freeze();
        assert!(matches!(
            decode_inv_list(&mut payload, "inv"),
            Err(BodyError::Truncated { .. })
        ));
    }

    #[test]
    fn test_inv_list_capacity_follows_payload() {
        let list = vec![InvVect::new(InvType::TX, ShaHash::digest(b"a")); 3];
        let mut buf = BytesMut::new();
        encode_inv_list(&mut buf, "inv", &list).unwrap();
        assert_eq!(buf.len(), var_int_size(3) + 3 * MAX_INV_VECT_PAYLOAD as usize);

        let decoded = decode_inv_list(&mut buf.freeze(), "inv").unwrap();
        assert_eq!(decoded, list);
        assert_eq!(decoded.capacity(), 3);
    }

    #[test]
    fn test_inv_type_display() {
        assert_eq!(InvType::BLOCK.to_string(), "MSG_BLOCK");
        assert_eq!(InvType::new(7).to_string(), "Unknown InvType (7)");
    }
}
