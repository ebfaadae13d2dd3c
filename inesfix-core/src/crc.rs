//! Content identity checksum.

use crc32fast::Hasher;

/// Compute the CRC-32 (IEEE) of a cartridge payload.
///
/// The checksum covers the payload region only. Callers must exclude the
/// 16-byte header and any trainer block so that the value matches the keying
/// convention of cartridge databases, which identify the distributable
/// cartridge contents rather than a particular file on disk.
#[must_use]
pub fn checksum(payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}
