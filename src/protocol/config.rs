//! Codec configuration

use std::io::{Read, Write};

use bytes::Bytes;

use super::codec::{read_message_n, write_message_n};
use super::{Message, NetworkId, PROTOCOL_VERSION, Payload, ReadError, Result, WriteError};

/// Settings shared by every read and write on one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecConfig {
    /// Negotiated protocol version
    pub protocol_version: u32,
    /// Network messages must belong to
    pub network: NetworkId,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            network: NetworkId::MAIN_NET,
        }
    }
}

impl CodecConfig {
    /// Use a different protocol version
    #[must_use]
    pub const fn with_protocol_version(mut self, protocol_version: u32) -> Self {
        self.protocol_version = protocol_version;
        self
    }

    /// Use a different network
    #[must_use]
    pub const fn with_network(mut self, network: NetworkId) -> Self {
        self.network = network;
        self
    }
}

/// Read and write pipelines bound to one configuration
///
/// Typically one per peer connection; the protocol version is updated once
/// the version handshake settles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    /// Create a codec with the given configuration
    #[must_use]
    pub const fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Current configuration
    #[must_use]
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Switch to a newly negotiated protocol version
    pub fn set_protocol_version(&mut self, protocol_version: u32) {
        self.config.protocol_version = protocol_version;
    }

    /// Read the next message, reporting bytes consumed
    pub fn read_n<R: Read + ?Sized>(
        &self,
        reader: &mut R,
    ) -> std::result::Result<(usize, Message, Bytes), ReadError> {
        read_message_n(reader, self.config.protocol_version, self.config.network)
    }

    /// Read the next message
    pub fn read<R: Read + ?Sized>(&self, reader: &mut R) -> Result<Message> {
        let (_, msg, _) = self.read_n(reader)?;
        Ok(msg)
    }

    /// Write a message, reporting bytes written
    pub fn write_n<W, P>(&self, writer: &mut W, msg: &P) -> std::result::Result<usize, WriteError>
    where
        W: Write + ?Sized,
        P: Payload + ?Sized,
    {
        write_message_n(writer, msg, self.config.protocol_version, self.config.network)
    }

    /// Write a message
    pub fn write<W, P>(&self, writer: &mut W, msg: &P) -> Result<()>
    where
        W: Write + ?Sized,
        P: Payload + ?Sized,
    {
        self.write_n(writer, msg)?;
        Ok(())
    }
}
