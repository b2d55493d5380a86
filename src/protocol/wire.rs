//! Wire primitives shared by the message variants
//!
//! Readers never panic on short input: every getter checks the remaining
//! length first and reports [`BodyError::Truncated`].

use std::io::{self, Read, Write};

use bytes::{Buf, BufMut, Bytes};

use super::{BodyError, BodyResult, HASH_SIZE, ShaHash};

/// Largest encoded size of a variable-length integer
pub const MAX_VAR_INT_PAYLOAD: u32 = 9;

/// Fill `buf` from `reader`, returning how many bytes arrived even on failure
///
/// Running out of input before `buf` is full yields
/// [`io::ErrorKind::UnexpectedEof`].
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> (usize, io::Result<()>) {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return (
                    filled,
                    Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended before buffer was filled",
                    )),
                );
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return (filled, Err(err)),
        }
    }
    (filled, Ok(()))
}

/// Write all of `buf`, returning how many bytes went out even on failure
pub fn write_full<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> (usize, io::Result<()>) {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => {
                return (
                    written,
                    Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write whole buffer",
                    )),
                );
            }
            Ok(n) => written += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return (written, Err(err)),
        }
    }
    (written, Ok(()))
}

fn ensure<B: Buf>(buf: &B, field: &'static str, needed: usize) -> BodyResult<()> {
    if buf.remaining() < needed {
        return Err(BodyError::Truncated {
            field,
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

pub(crate) fn get_u8<B: Buf>(buf: &mut B, field: &'static str) -> BodyResult<u8> {
    ensure(buf, field, 1)?;
    Ok(buf.get_u8())
}

pub(crate) fn get_u16_be<B: Buf>(buf: &mut B, field: &'static str) -> BodyResult<u16> {
    ensure(buf, field, 2)?;
    Ok(buf.get_u16())
}

pub(crate) fn get_u32<B: Buf>(buf: &mut B, field: &'static str) -> BodyResult<u32> {
    ensure(buf, field, 4)?;
    Ok(buf.get_u32_le())
}

pub(crate) fn get_i32<B: Buf>(buf: &mut B, field: &'static str) -> BodyResult<i32> {
    ensure(buf, field, 4)?;
    Ok(buf.get_i32_le())
}

pub(crate) fn get_u64<B: Buf>(buf: &mut B, field: &'static str) -> BodyResult<u64> {
    ensure(buf, field, 8)?;
    Ok(buf.get_u64_le())
}

pub(crate) fn get_i64<B: Buf>(buf: &mut B, field: &'static str) -> BodyResult<i64> {
    ensure(buf, field, 8)?;
    Ok(buf.get_i64_le())
}

pub(crate) fn get_array<B: Buf, const N: usize>(
    buf: &mut B,
    field: &'static str,
) -> BodyResult<[u8; N]> {
    ensure(buf, field, N)?;
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

pub(crate) fn get_hash<B: Buf>(buf: &mut B, field: &'static str) -> BodyResult<ShaHash> {
    get_array::<B, HASH_SIZE>(buf, field).map(ShaHash::new)
}

pub(crate) fn put_hash<B: BufMut>(buf: &mut B, hash: &ShaHash) {
    buf.put_slice(hash.as_bytes());
}

/// Read a variable-length integer
pub fn get_var_int<B: Buf>(buf: &mut B) -> BodyResult<u64> {
    let discriminant = get_u8(buf, "varint")?;
    match discriminant {
        0xFF => get_u64(buf, "varint"),
        0xFE => get_u32(buf, "varint").map(u64::from),
        0xFD => {
            ensure(buf, "varint", 2)?;
            Ok(u64::from(buf.get_u16_le()))
        }
        small => Ok(u64::from(small)),
    }
}

/// Write a variable-length integer using the shortest form
pub fn put_var_int<B: BufMut>(buf: &mut B, value: u64) {
    if value < 0xFD {
        buf.put_u8(value as u8);
    } else if value <= u64::from(u16::MAX) {
        buf.put_u8(0xFD);
        buf.put_u16_le(value as u16);
    } else if value <= u64::from(u32::MAX) {
        buf.put_u8(0xFE);
        buf.put_u32_le(value as u32);
    } else {
        buf.put_u8(0xFF);
        buf.put_u64_le(value);
    }
}

/// Encoded size of `value` as a variable-length integer
#[must_use]
pub const fn var_int_size(value: u64) -> usize {
    if value < 0xFD {
        1
    } else if value <= u16::MAX as u64 {
        3
    } else if value <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

/// Read a list length and check it against `max`
pub(crate) fn get_count<B: Buf>(
    buf: &mut B,
    command: &'static str,
    kind: &'static str,
    max: u64,
) -> BodyResult<usize> {
    let count = get_var_int(buf)?;
    check_count(command, kind, count, max)?;
    // Bounded by `max`, which always fits in memory-sized lists.
    Ok(count as usize)
}

pub(crate) fn check_count(
    command: &'static str,
    kind: &'static str,
    count: u64,
    max: u64,
) -> BodyResult<()> {
    if count > max {
        return Err(BodyError::TooManyItems {
            command,
            kind,
            count,
            max,
        });
    }
    Ok(())
}

/// Read a length-prefixed byte string of at most `max` bytes
pub fn get_var_bytes<B: Buf>(buf: &mut B, max: u32, field: &'static str) -> BodyResult<Bytes> {
    let len = get_var_int(buf)?;
    if len > u64::from(max) {
        return Err(BodyError::FieldTooLong {
            field,
            len,
            max: u64::from(max),
        });
    }
    let len = len as usize;
    ensure(buf, field, len)?;
    Ok(buf.copy_to_bytes(len))
}

/// Write a length-prefixed byte string
pub fn put_var_bytes<B: BufMut>(buf: &mut B, data: &[u8]) {
    put_var_int(buf, data.len() as u64);
    buf.put_slice(data);
}

/// Read a length-prefixed string of at most `max` bytes
///
/// Invalid UTF-8 is replaced rather than rejected; peers are free to send
/// arbitrary bytes in free-form text fields.
pub fn get_var_string<B: Buf>(buf: &mut B, max: u32, field: &'static str) -> BodyResult<String> {
    let raw = get_var_bytes(buf, max, field)?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}
