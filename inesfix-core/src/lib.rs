#![doc = include_str!("../README.md")]

pub mod crc;
pub mod db;
pub mod header;
pub mod patch;
pub mod reconcile;
pub mod rom;

pub mod prelude {
    //! Re-exports of the types most callers need.

    pub use crate::{
        db::{CanonicalProfile, GameDb},
        header::{Mirroring, NesHeader, TvSystem},
        patch, reconcile,
        reconcile::{Discrepancy, Field, FieldValue},
        rom::Rom,
    };
}
