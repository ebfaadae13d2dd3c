//! Scanned ROM images.
//!
//! A [`Rom`] records what one cartridge-image file actually contains: its
//! decoded header (or the fact that none is present), where the payload
//! starts, and the payload's CRC-32 identity.

use crate::{
    crc,
    header::{self, NesHeader, HEADER_LEN},
};
use thiserror::Error;
use tracing::debug;

/// Size of the optional trainer block between the header and the payload.
pub const TRAINER_LEN: usize = 512;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[must_use]
pub enum Error {
    #[error(transparent)]
    Header(#[from] header::Error),
    #[error("rom ends before the {section} section ({expected} bytes expected, {actual} present)")]
    Truncated {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// A cartridge image scanned from raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Rom {
    name: String,
    header: Option<NesHeader>,
    crc32: u32,
    payload_offset: usize,
}

impl Rom {
    /// Scan a ROM image: decode the header when present, locate the payload
    /// past any trainer block, and compute the payload-only checksum.
    ///
    /// # Errors
    ///
    /// Propagates header codec errors, and fails when the image ends before
    /// the trainer block the header advertises.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let header = NesHeader::decode(bytes)?;
        let payload_offset = match &header {
            None => 0,
            Some(header) => {
                let offset = if header.trainer {
                    HEADER_LEN + TRAINER_LEN
                } else {
                    HEADER_LEN
                };
                if bytes.len() < offset {
                    return Err(Error::Truncated {
                        section: "trainer",
                        expected: offset,
                        actual: bytes.len(),
                    });
                }
                offset
            }
        };
        let crc32 = crc::checksum(&bytes[payload_offset..]);
        debug!("scanned rom `{name}` crc: {crc32:08X}, header: {header:?}");
        Ok(Self {
            name,
            header,
            crc32,
            payload_offset,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decoded header, or `None` when the file has no header.
    #[must_use]
    pub const fn header(&self) -> Option<&NesHeader> {
        self.header.as_ref()
    }

    #[must_use]
    pub const fn has_header(&self) -> bool {
        self.header.is_some()
    }

    /// Payload-only CRC-32, the database lookup key.
    #[must_use]
    pub const fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Byte offset where the payload begins.
    #[must_use]
    pub const fn payload_offset(&self) -> usize {
        self.payload_offset
    }
}

impl std::fmt::Display for Rom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:08X})", self.name, self.crc32)
    }
}
