//! Peer addresses and the version handshake

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Command, Payload};
use crate::protocol::wire::{
    MAX_VAR_INT_PAYLOAD, check_count, get_array, get_count, get_i32, get_i64, get_u16_be,
    get_u32, get_u64, get_var_string, put_var_bytes, put_var_int,
};
use crate::protocol::{BodyError, BodyResult, MULTIPLE_ADDRESS_VERSION, NET_ADDRESS_TIME_VERSION};

/// Most addresses a single addr message may carry
pub const MAX_ADDR_PER_MSG: u32 = 1000;

/// Longest user agent a version message may carry
pub const MAX_USER_AGENT_LEN: u32 = 2000;

/// Largest encoded network address at `pver`
const fn max_net_address_payload(pver: u32) -> u32 {
    // services (8) + ip (16) + port (2), plus timestamp (4) once supported
    let base = 8 + 16 + 2;
    if pver >= NET_ADDRESS_TIME_VERSION {
        base + 4
    } else {
        base
    }
}

/// Network address of a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetAddress {
    /// Last time the address was seen (unix seconds); not sent in version messages
    pub timestamp: u32,
    /// Service flags advertised by the peer
    pub services: u64,
    /// Peer IP; IPv4 travels as an IPv4-mapped IPv6 address
    ///
    /// Decoding yields [`IpAddr::V4`] for mapped addresses, so a literal
    /// `V6(::ffff:a.b.c.d)` does not compare equal after a round trip.
    /// [`NetAddress::new`] applies the same normalisation.
    pub ip: IpAddr,
    /// Peer port, big-endian on the wire
    pub port: u16,
}

impl Default for NetAddress {
    fn default() -> Self {
        Self {
            timestamp: 0,
            services: 0,
            ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 0,
        }
    }
}

impl NetAddress {
    /// Create an address with no timestamp
    ///
    /// IPv4-mapped IPv6 addresses are stored as plain IPv4.
    #[must_use]
    pub fn new(ip: IpAddr, port: u16, services: u64) -> Self {
        Self {
            timestamp: 0,
            services,
            ip: ip.to_canonical(),
            port,
        }
    }

    fn decode<B: Buf>(buf: &mut B, pver: u32, with_timestamp: bool) -> BodyResult<Self> {
        let timestamp = if with_timestamp && pver >= NET_ADDRESS_TIME_VERSION {
            get_u32(buf, "address timestamp")?
        } else {
            0
        };
        let services = get_u64(buf, "address services")?;
        let raw: [u8; 16] = get_array(buf, "address ip")?;
        let port = get_u16_be(buf, "address port")?;

        let ip = IpAddr::V6(Ipv6Addr::from(raw)).to_canonical();

        Ok(Self {
            timestamp,
            services,
            ip,
            port,
        })
    }

    fn encode<B: BufMut>(&self, buf: &mut B, pver: u32, with_timestamp: bool) {
        if with_timestamp && pver >= NET_ADDRESS_TIME_VERSION {
            buf.put_u32_le(self.timestamp);
        }
        buf.put_u64_le(self.services);
        let v6 = match self.ip {
            IpAddr::V4(v4) => v4.to_ipv6_mapped(),
            IpAddr::V6(v6) => v6,
        };
        buf.put_slice(&v6.octets());
        buf.put_u16(self.port);
    }
}

/// First message of the handshake, describing the sender
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsgVersion {
    /// Protocol version the sender speaks
    pub protocol_version: i32,
    /// Services the sender offers
    pub services: u64,
    /// Sender clock (unix seconds)
    pub timestamp: i64,
    /// Address of the receiving peer
    pub addr_you: NetAddress,
    /// Address of the sender
    pub addr_me: NetAddress,
    /// Random nonce used to detect self-connections
    pub nonce: u64,
    /// Free-form client identifier
    pub user_agent: String,
    /// Height of the sender's best block
    pub last_block: i32,
}

impl MsgVersion {
    fn check_user_agent(len: usize) -> BodyResult<()> {
        if len > MAX_USER_AGENT_LEN as usize {
            return Err(BodyError::FieldTooLong {
                field: "user agent",
                len: len as u64,
                max: u64::from(MAX_USER_AGENT_LEN),
            });
        }
        Ok(())
    }
}

impl Payload for MsgVersion {
    fn decode(&mut self, buf: &mut Bytes, pver: u32) -> BodyResult<()> {
        self.protocol_version = get_i32(buf, "protocol version")?;
        self.services = get_u64(buf, "services")?;
        self.timestamp = get_i64(buf, "timestamp")?;
        self.addr_you = NetAddress::decode(buf, pver, false)?;

        // Old peers stop after the receiver address; later fields are only
        // present when bytes remain.
        if buf.has_remaining() {
            self.addr_me = NetAddress::decode(buf, pver, false)?;
        }
        if buf.has_remaining() {
            self.nonce = get_u64(buf, "nonce")?;
        }
        if buf.has_remaining() {
            self.user_agent = get_var_string(buf, MAX_USER_AGENT_LEN, "user agent")?;
        }
        if buf.has_remaining() {
            self.last_block = get_i32(buf, "last block")?;
        }
        Ok(())
    }

    fn encode(&self, buf: &mut BytesMut, pver: u32) -> BodyResult<()> {
        Self::check_user_agent(self.user_agent.len())?;

        buf.put_i32_le(self.protocol_version);
        buf.put_u64_le(self.services);
        buf.put_i64_le(self.timestamp);
        self.addr_you.encode(buf, pver, false);
        self.addr_me.encode(buf, pver, false);
        buf.put_u64_le(self.nonce);
        put_var_bytes(buf, self.user_agent.as_bytes());
        buf.put_i32_le(self.last_block);
        Ok(())
    }

    fn command(&self) -> &'static str {
        Command::Version.as_str()
    }

    fn max_payload_length(&self, pver: u32) -> u32 {
        33 + max_net_address_payload(pver) * 2 + MAX_VAR_INT_PAYLOAD + MAX_USER_AGENT_LEN
    }
}

/// Known peer addresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsgAddr {
    /// Advertised addresses
    pub addr_list: Vec<NetAddress>,
}

impl MsgAddr {
    /// Create an addr message from a list of addresses
    #[must_use]
    pub const fn new(addr_list: Vec<NetAddress>) -> Self {
        Self { addr_list }
    }

    const fn max_addresses(pver: u32) -> u64 {
        if pver < MULTIPLE_ADDRESS_VERSION {
            1
        } else {
            MAX_ADDR_PER_MSG as u64
        }
    }
}

impl Payload for MsgAddr {
    fn decode(&mut self, buf: &mut Bytes, pver: u32) -> BodyResult<()> {
        let count = get_count(buf, self.command(), "addresses", Self::max_addresses(pver))?;

        self.addr_list = Vec::with_capacity(count);
        for _ in 0..count {
            self.addr_list.push(NetAddress::decode(buf, pver, true)?);
        }
        Ok(())
    }

    fn encode(&self, buf: &mut BytesMut, pver: u32) -> BodyResult<()> {
        let count = self.addr_list.len() as u64;
        check_count(self.command(), "addresses", count, Self::max_addresses(pver))?;

        put_var_int(buf, count);
        for addr in &self.addr_list {
            addr.encode(buf, pver, true);
        }
        Ok(())
    }

    fn command(&self) -> &'static str {
        Command::Addr.as_str()
    }

    fn max_payload_length(&self, pver: u32) -> u32 {
        if pver < MULTIPLE_ADDRESS_VERSION {
            MAX_VAR_INT_PAYLOAD + max_net_address_payload(pver)
        } else {
            MAX_VAR_INT_PAYLOAD + MAX_ADDR_PER_MSG * max_net_address_payload(pver)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PROTOCOL_VERSION;

    fn sample_version() -> MsgVersion {
        MsgVersion {
            protocol_version: PROTOCOL_VERSION as i32,
            services: 1,
            timestamp: 1_231_006_505,
            addr_you: NetAddress::new(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 1)), 8333, 1),
            addr_me: NetAddress::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 18333, 0),
            nonce: 0x1234_5678_9ABC_DEF0,
            user_agent: "/btcwire:0.2.0/".to_owned(),
            last_block: 234_234,
        }
    }

    #[test]
    fn test_version_roundtrip() {
        let msg = sample_version();
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, PROTOCOL_VERSION).unwrap();
        // 4 + 8 + 8 + 26 + 26 + 8 + (1 + 15) + 4
        assert_eq!(buf.len(), 100);

        let mut decoded = MsgVersion::default();
        decoded.decode(&mut buf.freeze(), PROTOCOL_VERSION).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_version_optional_tail() {
        let msg = sample_version();
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, PROTOCOL_VERSION).unwrap();
        // Keep only the fields every peer sends.
        buf.truncate(4 + 8 + 8 + 26);

        let mut decoded = MsgVersion::default();
        decoded.decode(&mut buf.freeze(), PROTOCOL_VERSION).unwrap();
        assert_eq!(decoded.addr_you, msg.addr_you);
        assert_eq!(decoded.nonce, 0);
        assert!(decoded.user_agent.is_empty());
    }

    #[test]
    fn test_version_user_agent_limit() {
        let mut msg = sample_version();
        msg.user_agent = "x".repeat(MAX_USER_AGENT_LEN as usize + 1);
        let mut buf = BytesMut::new();
        assert!(matches!(
            msg.encode(&mut buf, PROTOCOL_VERSION),
            Err(BodyError::FieldTooLong { field: "user agent", .. })
        ));
    }

    #[test]
    fn test_addr_timestamp_gated_by_version() {
        let mut addr = NetAddress::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 8333, 1);
        addr.timestamp = 1_400_000_000;
        let msg = MsgAddr::new(vec![addr]);

        let mut new_buf = BytesMut::new();
        msg.encode(&mut new_buf, NET_ADDRESS_TIME_VERSION).unwrap();
        let mut old_buf = BytesMut::new();
        msg.encode(&mut old_buf, NET_ADDRESS_TIME_VERSION - 1).unwrap();
        assert_eq!(new_buf.len(), old_buf.len() + 4);

        let mut decoded = MsgAddr::default();
        decoded
            .decode(&mut new_buf.freeze(), NET_ADDRESS_TIME_VERSION)
            .unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_mapped_address_normalised() {
        let v4 = Ipv4Addr::new(1, 2, 3, 4);
        let mapped = NetAddress::new(IpAddr::V6(v4.to_ipv6_mapped()), 8333, 1);
        assert_eq!(mapped.ip, IpAddr::V4(v4));
        assert_eq!(mapped, NetAddress::new(IpAddr::V4(v4), 8333, 1));

        let msg = MsgAddr::new(vec![mapped]);
        let mut buf = BytesMut::new();
        msg.encode(&mut buf, PROTOCOL_VERSION).unwrap();
        let mut decoded = MsgAddr::default();
        decoded.decode(&mut buf.freeze(), PROTOCOL_VERSION).unwrap();
        assert_eq!(decoded, msg);

        // Plain IPv6 stays IPv6.
        let v6 = NetAddress::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 8333, 1);
        assert_eq!(v6.ip, IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn test_addr_count_limits() {
        let addr = NetAddress::default();
        let msg = MsgAddr::new(vec![addr; 2]);
        let mut buf = BytesMut::new();
        assert!(matches!(
            msg.encode(&mut buf, MULTIPLE_ADDRESS_VERSION - 1),
            Err(BodyError::TooManyItems { max: 1, .. })
        ));

        let mut forged = BytesMut::new();
        put_var_int(&mut forged, u64::from(MAX_ADDR_PER_MSG) + 1);
        let mut decoded = MsgAddr::default();
        assert!(matches!(
            decoded.decode(&mut forged.freeze(), PROTOCOL_VERSION),
            Err(BodyError::TooManyItems { count: 1001, .. })
        ));
    }
}
