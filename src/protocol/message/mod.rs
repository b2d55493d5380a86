//! Message variants and the command registry
//!
//! Every variant implements [`Payload`]; the closed [`Message`] enum wraps
//! them and is what the read pipeline hands back. The registry is the
//! `match` in [`Command::from_name`], built at compile time.

mod address;
mod blocks;
mod control;
mod inventory;
mod tx;

use bytes::{Bytes, BytesMut};

pub use address::{MAX_ADDR_PER_MSG, MAX_USER_AGENT_LEN, MsgAddr, MsgVersion, NetAddress};
pub use blocks::{
    BlockHeader, MAX_BLOCK_HEADER_PAYLOAD, MAX_BLOCK_HEADERS_PER_MSG, MAX_BLOCK_LOCATORS_PER_MSG,
    MsgBlock, MsgGetBlocks, MsgGetHeaders, MsgHeaders,
};
pub use control::{MsgAlert, MsgGetAddr, MsgMemPool, MsgPing, MsgPong, MsgVerAck};
pub use inventory::{InvType, InvVect, MAX_INV_PER_MSG, MsgGetData, MsgInv, MsgNotFound};
pub use tx::{MAX_BLOCK_PAYLOAD, MsgTx, OutPoint, TxIn, TxOut};

use super::{BodyResult, Error, Result};

/// Capabilities every message variant provides to the pipelines
pub trait Payload {
    /// Decode the message body from `buf`
    fn decode(&mut self, buf: &mut Bytes, pver: u32) -> BodyResult<()>;

    /// Append the encoded message body to `buf`
    fn encode(&self, buf: &mut BytesMut, pver: u32) -> BodyResult<()>;

    /// Command name carried in the header
    fn command(&self) -> &'static str;

    /// Largest body this message may have at `pver`
    fn max_payload_length(&self, pver: u32) -> u32;
}

macro_rules! messages {
    ($($(#[$doc:meta])* $variant:ident($ty:ty) => $name:literal,)+) => {
        /// Commands carried in message headers
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Command {
            $($(#[$doc])* $variant,)+
        }

        impl Command {
            /// Every known command
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Command name as carried on the wire
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Look up a command by exact, case-sensitive name
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        /// Bitcoin protocol message
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Message {
            $($(#[$doc])* $variant($ty),)+
        }

        impl Message {
            /// Empty message of the given kind, ready to be decoded into
            #[must_use]
            pub fn empty(command: Command) -> Self {
                match command {
                    $(Command::$variant => Self::$variant(<$ty>::default()),)+
                }
            }

            /// Kind of this message
            #[must_use]
            pub const fn kind(&self) -> Command {
                match self {
                    $(Self::$variant(_) => Command::$variant,)+
                }
            }

            fn as_payload(&self) -> &dyn Payload {
                match self {
                    $(Self::$variant(msg) => msg,)+
                }
            }

            fn as_payload_mut(&mut self) -> &mut dyn Payload {
                match self {
                    $(Self::$variant(msg) => msg,)+
                }
            }
        }

        $(
            impl From<$ty> for Message {
                fn from(msg: $ty) -> Self {
                    Self::$variant(msg)
                }
            }
        )+
    };
}

messages! {
    /// Version handshake
    Version(MsgVersion) => "version",
    /// Version acknowledgement
    VerAck(MsgVerAck) => "verack",
    /// Request for known addresses
    GetAddr(MsgGetAddr) => "getaddr",
    /// Known addresses
    Addr(MsgAddr) => "addr",
    /// Request for block inventory
    GetBlocks(MsgGetBlocks) => "getblocks",
    /// Inventory announcement
    Inv(MsgInv) => "inv",
    /// Request for data by inventory
    GetData(MsgGetData) => "getdata",
    /// Requested data not available
    NotFound(MsgNotFound) => "notfound",
    /// Full block
    Block(MsgBlock) => "block",
    /// Transaction
    Tx(MsgTx) => "tx",
    /// Request for block headers
    GetHeaders(MsgGetHeaders) => "getheaders",
    /// Block headers
    Headers(MsgHeaders) => "headers",
    /// Keep-alive
    Ping(MsgPing) => "ping",
    /// Keep-alive reply
    Pong(MsgPong) => "pong",
    /// Signed network alert
    Alert(MsgAlert) => "alert",
    /// Request for mempool inventory
    MemPool(MsgMemPool) => "mempool",
}

impl Message {
    /// Empty message for a header command
    ///
    /// Unknown commands are an error, never a fallback to another kind.
    pub fn from_command(command: &str) -> Result<Self> {
        Command::from_name(command)
            .map(Self::empty)
            .ok_or_else(|| Error::UnknownCommand {
                command: command.to_owned(),
            })
    }
}

impl Payload for Message {
    fn decode(&mut self, buf: &mut Bytes, pver: u32) -> BodyResult<()> {
        self.as_payload_mut().decode(buf, pver)
    }

    fn encode(&self, buf: &mut BytesMut, pver: u32) -> BodyResult<()> {
        self.as_payload().encode(buf, pver)
    }

    fn command(&self) -> &'static str {
        self.kind().as_str()
    }

    fn max_payload_length(&self, pver: u32) -> u32 {
        self.as_payload().max_payload_length(pver)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{COMMAND_SIZE, MAX_MESSAGE_PAYLOAD, PROTOCOL_VERSION};

    #[test]
    fn test_registry_covers_every_command() {
        assert_eq!(Command::ALL.len(), 16);
        for &command in Command::ALL {
            let msg = Message::from_command(command.as_str()).unwrap();
            assert_eq!(msg.kind(), command);
            assert_eq!(msg.command(), command.as_str());
            assert!(command.as_str().len() <= COMMAND_SIZE);
        }
    }

    #[test]
    fn test_registry_exact_match_only() {
        for name in ["Version", "VERACK", "ping ", "", "bogus1234567"] {
            assert!(matches!(
                Message::from_command(name),
                Err(Error::UnknownCommand { command }) if command == name
            ));
        }
    }

    #[test]
    fn test_type_caps_within_global_cap() {
        for &command in Command::ALL {
            let msg = Message::empty(command);
            assert!(msg.max_payload_length(PROTOCOL_VERSION) <= MAX_MESSAGE_PAYLOAD);
        }
    }

    #[test]
    fn test_known_type_caps() {
        let pver = PROTOCOL_VERSION;
        assert_eq!(Message::empty(Command::VerAck).max_payload_length(pver), 0);
        assert_eq!(Message::empty(Command::Ping).max_payload_length(pver), 8);
        assert_eq!(Message::empty(Command::Inv).max_payload_length(pver), 1_800_009);
        assert_eq!(Message::empty(Command::GetBlocks).max_payload_length(pver), 16_045);
        assert_eq!(Message::empty(Command::Headers).max_payload_length(pver), 162_009);
        assert_eq!(Message::empty(Command::Tx).max_payload_length(pver), 1_000_000);
        assert_eq!(Message::empty(Command::Addr).max_payload_length(pver), 30_009);
        assert_eq!(Message::empty(Command::Version).max_payload_length(pver), 2_102);
    }
}
