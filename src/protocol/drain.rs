//! Bounded discard of rejected payloads

use std::io::Read;

use tracing::debug;

use super::DRAIN_CHUNK_SIZE;
use super::wire::read_full;

/// Read and discard `n` bytes from `reader`
///
/// Uses one fixed [`DRAIN_CHUNK_SIZE`] buffer for every chunk, so a forged
/// length field cannot force a large allocation. Errors are not reported:
/// draining is best-effort resynchronisation after a message was already
/// rejected. Returns the number of bytes actually discarded.
pub fn drain<R: Read + ?Sized>(reader: &mut R, n: u32) -> usize {
    let total = n as usize;
    let full_chunks = total / DRAIN_CHUNK_SIZE;
    let remainder = total % DRAIN_CHUNK_SIZE;

    let mut buf = [0u8; DRAIN_CHUNK_SIZE];
    let mut discarded = 0;

    for _ in 0..full_chunks {
        let (read, outcome) = read_full(reader, &mut buf);
        discarded += read;
        if let Err(err) = outcome {
            debug!(requested = total, discarded, error = %err, "drain stopped early");
            return discarded;
        }
    }

    if remainder > 0 {
        let (read, outcome) = read_full(reader, &mut buf[..remainder]);
        discarded += read;
        if let Err(err) = outcome {
            debug!(requested = total, discarded, error = %err, "drain stopped early");
        }
    }

    discarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stream(len: usize) -> Cursor<Vec<u8>> {
        Cursor::new((0..len).map(|i| (i % 251) as u8).collect())
    }

    #[test]
    fn test_drain_exact_lengths() {
        for n in [
            0,
            1,
            DRAIN_CHUNK_SIZE - 1,
            DRAIN_CHUNK_SIZE,
            DRAIN_CHUNK_SIZE + 1,
            3 * DRAIN_CHUNK_SIZE + 17,
        ] {
            let mut reader = stream(n + 5);
            let discarded = drain(&mut reader, n as u32);
            assert_eq!(discarded, n);
            assert_eq!(reader.position() as usize, n);

            let mut rest = Vec::new();
            reader.read_to_end(&mut rest).unwrap();
            let expected: Vec<u8> = (n..n + 5).map(|i| (i % 251) as u8).collect();
            assert_eq!(rest, expected);
        }
    }

    #[test]
    fn test_drain_short_stream() {
        let mut reader = stream(DRAIN_CHUNK_SIZE + 10);
        let discarded = drain(&mut reader, (2 * DRAIN_CHUNK_SIZE) as u32);
        assert_eq!(discarded, DRAIN_CHUNK_SIZE + 10);
    }
}
