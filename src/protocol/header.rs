//! Message header
//!
//! Every message starts with a fixed 24-byte header.

use std::io::Read;

use super::wire::read_full;
use super::{CHECKSUM_SIZE, COMMAND_SIZE, Error, HEADER_SIZE, NetworkId, ReadError, Result};

/// Bitcoin message header (24 bytes)
///
/// # Wire Format
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        Network Id (4)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                                                               +
/// |             Command (12, ASCII, zero padded)                  |
/// +                                                               +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     Payload Length (4)                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     Checksum Prefix (4)                       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Integers are little-endian. The header only handles structure; whether
/// the fields make sense is checked by the read and write pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    network: NetworkId,
    command: [u8; COMMAND_SIZE],
    length: u32,
    checksum: [u8; CHECKSUM_SIZE],
}

impl MessageHeader {
    /// Create a new message header
    pub fn new(
        network: NetworkId,
        command: &str,
        length: u32,
        checksum: [u8; CHECKSUM_SIZE],
    ) -> Result<Self> {
        let raw = command.as_bytes();
        if raw.len() > COMMAND_SIZE {
            return Err(Error::CommandTooLong {
                command: command.to_owned(),
                max: COMMAND_SIZE,
            });
        }

        let mut padded = [0u8; COMMAND_SIZE];
        padded[..raw.len()].copy_from_slice(raw);

        Ok(Self {
            network,
            command: padded,
            length,
            checksum,
        })
    }

    /// Get network id
    #[must_use]
    pub const fn network(&self) -> NetworkId {
        self.network
    }

    /// Command bytes with trailing zero padding removed
    #[must_use]
    pub fn command_bytes(&self) -> &[u8] {
        let end = self
            .command
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        &self.command[..end]
    }

    /// Command as text
    ///
    /// Fails with [`Error::InvalidCommand`] unless the command is UTF-8
    /// without control characters.
    pub fn command(&self) -> Result<&str> {
        let raw = self.command_bytes();
        match std::str::from_utf8(raw) {
            Ok(text) if !text.chars().any(char::is_control) => Ok(text),
            _ => Err(Error::InvalidCommand { raw: raw.to_vec() }),
        }
    }

    /// Get declared payload length
    #[must_use]
    pub const fn payload_len(&self) -> u32 {
        self.length
    }

    /// Get checksum prefix
    #[must_use]
    pub const fn checksum(&self) -> [u8; CHECKSUM_SIZE] {
        self.checksum
    }

    /// Convert to bytes (little-endian)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];

        bytes[0..4].copy_from_slice(&self.network.as_u32().to_le_bytes());
        bytes[4..16].copy_from_slice(&self.command);
        bytes[16..20].copy_from_slice(&self.length.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.checksum);

        bytes
    }

    /// Parse from bytes (little-endian)
    #[must_use]
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut command = [0u8; COMMAND_SIZE];
        command.copy_from_slice(&bytes[4..16]);
        let mut checksum = [0u8; CHECKSUM_SIZE];
        checksum.copy_from_slice(&bytes[20..24]);

        Self {
            network: NetworkId::new(u32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ])),
            command,
            length: u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]),
            checksum,
        }
    }

    /// Read exactly one header from `reader`
    ///
    /// A short read is an IO error; the error reports how many bytes were
    /// consumed before the stream ran dry. On success exactly
    /// [`HEADER_SIZE`] bytes were read.
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> std::result::Result<Self, ReadError> {
        let mut bytes = [0u8; HEADER_SIZE];
        let (n, outcome) = read_full(reader, &mut bytes);
        outcome.map_err(|err| ReadError::new(n, err))?;
        Ok(Self::from_bytes(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_roundtrip() {
        let header =
            MessageHeader::new(NetworkId::MAIN_NET, "version", 102, [1, 2, 3, 4]).unwrap();
        let bytes = header.to_bytes();
        let decoded = MessageHeader::from_bytes(&bytes);

        assert_eq!(decoded, header);
        assert_eq!(decoded.network(), NetworkId::MAIN_NET);
        assert_eq!(decoded.command().unwrap(), "version");
        assert_eq!(decoded.payload_len(), 102);
        assert_eq!(decoded.checksum(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_header_layout() {
        let header = MessageHeader::new(NetworkId::MAIN_NET, "verack", 0, [0x5D, 0xF6, 0xE0, 0xE2])
            .unwrap();
        let expected: [u8; HEADER_SIZE] = [
            0xF9, 0xBE, 0xB4, 0xD9, // magic
            b'v', b'e', b'r', b'a', b'c', b'k', 0, 0, 0, 0, 0, 0, // command
            0, 0, 0, 0, // length
            0x5D, 0xF6, 0xE0, 0xE2, // checksum
        ];
        assert_eq!(header.to_bytes(), expected);
    }

    #[test]
    fn test_command_padding_stripped() {
        for command in ["tx", "inv", "getheaders", "notfound12ab"] {
            let header = MessageHeader::new(NetworkId::TEST_NET3, command, 0, [0; 4]).unwrap();
            let decoded = MessageHeader::from_bytes(&header.to_bytes());
            assert_eq!(decoded.command().unwrap(), command);
            assert!(!decoded.command_bytes().contains(&0));
        }
    }

    #[test]
    fn test_command_too_long() {
        let result = MessageHeader::new(NetworkId::MAIN_NET, "thirteenchars", 0, [0; 4]);
        assert!(matches!(
            result,
            Err(Error::CommandTooLong { max: COMMAND_SIZE, .. })
        ));
    }

    #[test]
    fn test_invalid_command_text() {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[4] = 0xFF;
        bytes[5] = 0xFE;
        let header = MessageHeader::from_bytes(&bytes);
        assert!(matches!(
            header.command(),
            Err(Error::InvalidCommand { raw }) if raw == [0xFF, 0xFE]
        ));

        let mut bytes = [0u8; HEADER_SIZE];
        bytes[4..8].copy_from_slice(b"pi\x01g");
        let header = MessageHeader::from_bytes(&bytes);
        assert!(matches!(header.command(), Err(Error::InvalidCommand { .. })));
    }

    #[test]
    fn test_short_read_reports_consumed() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        let err = MessageHeader::read(&mut cursor).unwrap_err();
        assert_eq!(err.bytes_read, 10);
        assert!(matches!(
            err.source,
            Error::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof
        ));
    }

    // Property-based tests
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: command names survive padding on the wire
            #[test]
            fn prop_command_padding(command in "[a-z]{1,12}", length in any::<u32>()) {
                let header = MessageHeader::new(NetworkId::MAIN_NET, &command, length, [0; 4])
                    .unwrap();
                let decoded = MessageHeader::from_bytes(&header.to_bytes());
                prop_assert_eq!(decoded.command().unwrap(), command.as_str());
                prop_assert!(!decoded.command_bytes().contains(&0));
                prop_assert_eq!(decoded.payload_len(), length);
            }
        }
    }
}
