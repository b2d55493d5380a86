//! Message read/write pipelines
//!
//! # Format
//!
//! ```text
//! [HEADER (24 bytes)] [PAYLOAD (payload length bytes)]
//! ```
//!
//! Reads validate the header before touching the payload: the global cap,
//! the network, the command text, the registry, and the per-type cap all
//! run before any payload-sized allocation. Rejections that leave a payload
//! on the stream drain it first so the next read starts on a header.

use std::io::{Read, Write};

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use super::wire::{read_full, write_full};
use super::{
    COMMAND_SIZE, Error, HEADER_SIZE, MAX_MESSAGE_PAYLOAD, Message, MessageHeader, NetworkId,
    Payload, ReadError, Result, WriteError, checksum, drain,
};

/// Read, validate, and decode the next message from `reader`
///
/// Returns the number of bytes consumed, the decoded message, and the raw
/// payload bytes. On failure the error reports how many bytes were
/// consumed, including any payload drained to resynchronise the stream,
/// and carries the raw payload when body decoding was attempted.
pub fn read_message_n<R: Read + ?Sized>(
    reader: &mut R,
    pver: u32,
    network: NetworkId,
) -> std::result::Result<(usize, Message, Bytes), ReadError> {
    let header = MessageHeader::read(reader)?;
    let mut total = HEADER_SIZE;
    let length = header.payload_len();

    // Nothing beyond the header has been consumed; the payload stays on the
    // stream for the caller to deal with.
    if length > MAX_MESSAGE_PAYLOAD {
        debug!(len = length, "header declares oversized payload");
        return Err(ReadError::new(
            total,
            Error::OversizedPayload {
                size: u64::from(length),
                max: MAX_MESSAGE_PAYLOAD,
            },
        ));
    }

    let rejected = |reader: &mut R, error: Error| {
        let drained = drain(reader, length);
        debug!(len = length, drained, %error, "rejected message header");
        ReadError::new(total + drained, error)
    };

    if header.network() != network {
        return Err(rejected(
            reader,
            Error::WrongNetwork {
                expected: network,
                found: header.network(),
            },
        ));
    }

    let command = match header.command() {
        Ok(command) => command,
        Err(error) => return Err(rejected(reader, error)),
    };

    let mut msg = match Message::from_command(command) {
        Ok(msg) => msg,
        Err(error) => return Err(rejected(reader, error)),
    };

    let max = msg.max_payload_length(pver);
    if length > max {
        return Err(rejected(
            reader,
            Error::PayloadTooLargeForType {
                command: msg.command(),
                size: u64::from(length),
                max,
            },
        ));
    }

    // Bounded by both caps above.
    let mut payload = vec![0u8; length as usize];
    let (n, outcome) = read_full(reader, &mut payload);
    total += n;
    outcome.map_err(|err| ReadError::new(total, err))?;
    let payload = Bytes::from(payload);

    let actual = checksum(&payload);
    if actual != header.checksum() {
        debug!(command = msg.command(), len = length, "payload checksum mismatch");
        return Err(ReadError::new(
            total,
            Error::ChecksumMismatch {
                expected: header.checksum(),
                found: actual,
            },
        ));
    }

    let mut body = payload.clone();
    if let Err(err) = msg.decode(&mut body, pver) {
        debug!(command = msg.command(), error = %err, "failed to decode message body");
        return Err(ReadError {
            bytes_read: total,
            payload: Some(payload),
            source: err.into(),
        });
    }

    trace!(command = msg.command(), len = length, "read message");
    Ok((total, msg, payload))
}

/// Read, validate, and decode the next message from `reader`
///
/// Same as [`read_message_n`] without the byte count.
pub fn read_message<R: Read + ?Sized>(
    reader: &mut R,
    pver: u32,
    network: NetworkId,
) -> Result<(Message, Bytes)> {
    let (_, msg, payload) = read_message_n(reader, pver, network)?;
    Ok((msg, payload))
}

/// Encode `msg` with its header and write it to `writer`
///
/// Returns the number of bytes written. On failure the error reports how
/// many bytes reached the writer before it failed.
pub fn write_message_n<W, P>(
    writer: &mut W,
    msg: &P,
    pver: u32,
    network: NetworkId,
) -> std::result::Result<usize, WriteError>
where
    W: Write + ?Sized,
    P: Payload + ?Sized,
{
    let command = msg.command();
    if command.len() > COMMAND_SIZE {
        return Err(WriteError::new(
            0,
            Error::CommandTooLong {
                command: command.to_owned(),
                max: COMMAND_SIZE,
            },
        ));
    }

    let mut body = BytesMut::new();
    msg.encode(&mut body, pver)
        .map_err(|err| WriteError::new(0, err))?;
    let payload = body.freeze();
    let size = payload.len() as u64;

    if size > u64::from(MAX_MESSAGE_PAYLOAD) {
        return Err(WriteError::new(
            0,
            Error::OversizedPayload {
                size,
                max: MAX_MESSAGE_PAYLOAD,
            },
        ));
    }

    let max = msg.max_payload_length(pver);
    if size > u64::from(max) {
        return Err(WriteError::new(
            0,
            Error::PayloadTooLargeForType {
                command,
                size,
                max,
            },
        ));
    }

    // Fits in u32: bounded by the global cap above.
    let header = MessageHeader::new(network, command, size as u32, checksum(&payload))
        .map_err(|err| WriteError::new(0, err))?;

    let (mut total, outcome) = write_full(writer, &header.to_bytes());
    outcome.map_err(|err| WriteError::new(total, err))?;

    let (n, outcome) = write_full(writer, &payload);
    total += n;
    outcome.map_err(|err| WriteError::new(total, err))?;

    trace!(command, len = size, %network, "wrote message");
    Ok(total)
}

/// Encode `msg` with its header and write it to `writer`
///
/// Same as [`write_message_n`] without the byte count.
pub fn write_message<W, P>(writer: &mut W, msg: &P, pver: u32, network: NetworkId) -> Result<()>
where
    W: Write + ?Sized,
    P: Payload + ?Sized,
{
    write_message_n(writer, msg, pver, network)?;
    Ok(())
}
