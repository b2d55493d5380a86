//! Messages with empty or fixed-size bodies

use bytes::{BufMut, Bytes, BytesMut};

use super::{Command, Payload};
use crate::protocol::wire::{get_u64, get_var_bytes, put_var_bytes};
use crate::protocol::{BIP0031_VERSION, BIP0035_VERSION, BodyError, BodyResult, MAX_MESSAGE_PAYLOAD};

macro_rules! empty_message {
    ($(#[$doc:meta])* $name:ident => $command:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl Payload for $name {
            fn decode(&mut self, _buf: &mut Bytes, _pver: u32) -> BodyResult<()> {
                Ok(())
            }

            fn encode(&self, _buf: &mut BytesMut, _pver: u32) -> BodyResult<()> {
                Ok(())
            }

            fn command(&self) -> &'static str {
                Command::$command.as_str()
            }

            fn max_payload_length(&self, _pver: u32) -> u32 {
                0
            }
        }
    };
}

empty_message!(
    /// Acknowledges a version message; no body
    MsgVerAck => VerAck
);

empty_message!(
    /// Asks a peer for known addresses; no body
    MsgGetAddr => GetAddr
);

/// Asks a peer for its mempool inventory; no body
///
/// Only valid from [`BIP0035_VERSION`] on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MsgMemPool;

impl MsgMemPool {
    fn check_version(pver: u32) -> BodyResult<()> {
        if pver < BIP0035_VERSION {
            return Err(BodyError::UnsupportedVersion {
                command: Command::MemPool.as_str(),
                pver,
                required: BIP0035_VERSION,
            });
        }
        Ok(())
    }
}

impl Payload for MsgMemPool {
    fn decode(&mut self, _buf: &mut Bytes, pver: u32) -> BodyResult<()> {
        Self::check_version(pver)
    }

    fn encode(&self, _buf: &mut BytesMut, pver: u32) -> BodyResult<()> {
        Self::check_version(pver)
    }

    fn command(&self) -> &'static str {
        Command::MemPool.as_str()
    }

    fn max_payload_length(&self, _pver: u32) -> u32 {
        0
    }
}

/// Keep-alive probe
///
/// The nonce is only on the wire after [`BIP0031_VERSION`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MsgPing {
    /// Echoed back in the matching pong
    pub nonce: u64,
}

impl MsgPing {
    /// Create a ping with the given nonce
    #[must_use]
    pub const fn new(nonce: u64) -> Self {
        Self { nonce }
    }
}

impl Payload for MsgPing {
    fn decode(&mut self, buf: &mut Bytes, pver: u32) -> BodyResult<()> {
        if pver > BIP0031_VERSION {
            self.nonce = get_u64(buf, "ping nonce")?;
        }
        Ok(())
    }

    fn encode(&self, buf: &mut BytesMut, pver: u32) -> BodyResult<()> {
        if pver > BIP0031_VERSION {
            buf.put_u64_le(self.nonce);
        }
        Ok(())
    }

    fn command(&self) -> &'static str {
        Command::Ping.as_str()
    }

    fn max_payload_length(&self, pver: u32) -> u32 {
        if pver > BIP0031_VERSION { 8 } else { 0 }
    }
}

/// Reply to a ping, carrying its nonce
///
/// Does not exist at or before [`BIP0031_VERSION`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MsgPong {
    /// Nonce from the ping being answered
    pub nonce: u64,
}

impl MsgPong {
    /// Create a pong answering the given nonce
    #[must_use]
    pub const fn new(nonce: u64) -> Self {
        Self { nonce }
    }

    fn check_version(pver: u32) -> BodyResult<()> {
        if pver <= BIP0031_VERSION {
            return Err(BodyError::UnsupportedVersion {
                command: Command::Pong.as_str(),
                pver,
                required: BIP0031_VERSION + 1,
            });
        }
        Ok(())
    }
}

impl Payload for MsgPong {
    fn decode(&mut self, buf: &mut Bytes, pver: u32) -> BodyResult<()> {
        Self::check_version(pver)?;
        self.nonce = get_u64(buf, "pong nonce")?;
        Ok(())
    }

    fn encode(&self, buf: &mut BytesMut, pver: u32) -> BodyResult<()> {
        Self::check_version(pver)?;
        buf.put_u64_le(self.nonce);
        Ok(())
    }

    fn command(&self) -> &'static str {
        Command::Pong.as_str()
    }

    fn max_payload_length(&self, pver: u32) -> u32 {
        if pver > BIP0031_VERSION { 8 } else { 0 }
    }
}

/// Signed network alert, kept in serialized form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsgAlert {
    /// Serialized alert body
    pub serialized_payload: Bytes,
    /// Signature over `serialized_payload`
    pub signature: Bytes,
}

impl MsgAlert {
    /// Create an alert from its serialized body and signature
    pub fn new(serialized_payload: impl Into<Bytes>, signature: impl Into<Bytes>) -> Self {
        Self {
            serialized_payload: serialized_payload.into(),
            signature: signature.into(),
        }
    }
}

impl Payload for MsgAlert {
    fn decode(&mut self, buf: &mut Bytes, _pver: u32) -> BodyResult<()> {
        self.serialized_payload = get_var_bytes(buf, MAX_MESSAGE_PAYLOAD, "alert payload")?;
        self.signature = get_var_bytes(buf, MAX_MESSAGE_PAYLOAD, "alert signature")?;
        Ok(())
    }

    fn encode(&self, buf: &mut BytesMut, _pver: u32) -> BodyResult<()> {
        put_var_bytes(buf, &self.serialized_payload);
        put_var_bytes(buf, &self.signature);
        Ok(())
    }

    fn command(&self) -> &'static str {
        Command::Alert.as_str()
    }

    fn max_payload_length(&self, _pver: u32) -> u32 {
        MAX_MESSAGE_PAYLOAD
    }
}
