//! Applying corrected headers back to ROM images.

use crate::header::{self, NesHeader, HEADER_LEN, MAGIC};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[must_use]
pub enum Error {
    #[error(
        "can't insert a header that claims trainer data: the trainer/payload boundary is unknown"
    )]
    TrainerWithoutHeader,
    #[error(transparent)]
    Header(#[from] header::Error),
}

/// Produce a patched copy of `original` carrying `header`.
///
/// When `original` already starts with a header, its 16 bytes are replaced in
/// place; otherwise a fresh 16-byte header is prepended. Payload bytes are
/// copied unchanged, and the result is never truncated or padded.
///
/// # Errors
///
/// Fails when `header` has out-of-range fields, or when it claims a trainer
/// block but `original` had no header to begin with: the payload boundary
/// would be ambiguous, so the file is left for the user to repair.
pub fn apply(original: &[u8], header: &NesHeader) -> Result<Vec<u8>> {
    let encoded = header.encode()?;
    let had_header = original.len() >= HEADER_LEN && original[..MAGIC.len()] == MAGIC;
    if had_header {
        let mut patched = original.to_vec();
        patched[..HEADER_LEN].copy_from_slice(&encoded);
        Ok(patched)
    } else {
        if header.trainer {
            return Err(Error::TrainerWithoutHeader);
        }
        let mut patched = Vec::with_capacity(HEADER_LEN + original.len());
        patched.extend_from_slice(&encoded);
        patched.extend_from_slice(original);
        Ok(patched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Mirroring;

    fn corrected() -> NesHeader {
        NesHeader {
            prg_rom_banks: 2,
            chr_rom_banks: 1,
            mirroring: Mirroring::Vertical,
            ..NesHeader::default()
        }
    }

    #[test]
    fn replaces_existing_header_in_place() {
        let stale = NesHeader::default();
        let mut original = stale.encode().expect("in-range header").to_vec();
        original.extend_from_slice(&[0xAB; 128]);

        let patched = apply(&original, &corrected()).expect("patched");
        assert_eq!(patched.len(), original.len());
        assert_eq!(
            NesHeader::decode(&patched).expect("valid header"),
            Some(corrected())
        );
        assert_eq!(&patched[HEADER_LEN..], &original[HEADER_LEN..]);
    }

    #[test]
    fn prepends_header_when_none_existed() {
        let original = vec![0xCD; 64];
        let patched = apply(&original, &corrected()).expect("patched");
        assert_eq!(patched.len(), HEADER_LEN + original.len());
        assert_eq!(
            NesHeader::decode(&patched).expect("valid header"),
            Some(corrected())
        );
        assert_eq!(&patched[HEADER_LEN..], &original[..]);
    }

    #[test]
    fn refuses_trainer_without_prior_header() {
        let header = NesHeader {
            trainer: true,
            ..corrected()
        };
        let err = apply(&[0xCD; 64], &header).expect_err("no trainer boundary");
        assert!(matches!(err, Error::TrainerWithoutHeader));
    }

    #[test]
    fn trainer_block_survives_a_replace() {
        let header = NesHeader {
            trainer: true,
            ..corrected()
        };
        let mut original = header.encode().expect("in-range header").to_vec();
        original.extend_from_slice(&[0xEE; crate::rom::TRAINER_LEN]);
        original.extend_from_slice(&[0xAB; 64]);

        let patched = apply(&original, &header).expect("patched");
        assert_eq!(&patched[HEADER_LEN..], &original[HEADER_LEN..]);
    }

    #[test]
    fn out_of_range_field_fails() {
        let header = NesHeader {
            mapper_num: 300,
            ..NesHeader::default()
        };
        let err = apply(&[0x00; 32], &header).expect_err("out of range");
        assert!(matches!(
            err,
            Error::Header(header::Error::FieldOutOfRange { .. })
        ));
    }
}
