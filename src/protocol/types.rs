//! Network identifiers and hashes

use std::fmt;

/// Network a message belongs to (header magic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkId(u32);

impl NetworkId {
    /// Main bitcoin network
    pub const MAIN_NET: Self = Self(0xD9B4_BEF9);
    /// Regression test network
    pub const TEST_NET: Self = Self(0xDAB5_BFFA);
    /// Test network (version 3)
    pub const TEST_NET3: Self = Self(0x0709_110B);
    /// Simulation test network
    pub const SIM_NET: Self = Self(0x1214_1C16);

    /// Wrap a raw magic value
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw magic value
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Name of a well-known network
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Self::MAIN_NET => Some("MainNet"),
            Self::TEST_NET => Some("TestNet"),
            Self::TEST_NET3 => Some("TestNet3"),
            Self::SIM_NET => Some("SimNet"),
            _ => None,
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "Unknown NetworkId ({})", self.0),
        }
    }
}

/// Size of a hash in bytes
pub const HASH_SIZE: usize = 32;

/// Double SHA-256 hash as carried on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ShaHash([u8; HASH_SIZE]);

impl ShaHash {
    /// Wrap raw hash bytes in wire order
    #[must_use]
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Hash bytes in wire order
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Hash of `data`
    #[must_use]
    pub fn digest(data: &[u8]) -> Self {
        Self(super::double_sha256(data))
    }
}

impl From<[u8; HASH_SIZE]> for ShaHash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

// Hashes are displayed byte-reversed, matching block explorers.
impl fmt::Display for ShaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "{}", hex::encode(reversed))
    }
}
