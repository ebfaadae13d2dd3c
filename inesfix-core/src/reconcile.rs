//! Header reconciliation against a canonical profile.
//!
//! [`diff`] reports field-level discrepancies between what a file's header
//! says and what the database says it should say. [`merge`] produces the
//! corrected header. The two agree: merging and re-diffing yields nothing.

use crate::{
    db::CanonicalProfile,
    header::{Mirroring, NesHeader},
};

/// Reconciled header fields, in report order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub enum Field {
    PrgRom,
    ChrRom,
    Mapper,
    Mirroring,
    Battery,
}

impl Field {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PrgRom => "PRG ROM",
            Self::ChrRom => "CHR ROM",
            Self::Mapper => "Mapper",
            Self::Mirroring => "Mirroring",
            Self::Battery => "Battery",
        }
    }
}

/// A reconciled field value, tagged so reports can render it the way users
/// read headers: sizes in KiB, `CHR RAM` for boards without CHR ROM, and
/// `none` when no header was present at all.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub enum FieldValue {
    PrgRom(u16),
    ChrRom(u16),
    Mapper(u16),
    Mirroring(Mirroring),
    Battery(bool),
    Missing,
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrgRom(banks) => write!(f, "{} KiB", u32::from(*banks) * 16),
            Self::ChrRom(0) => write!(f, "CHR RAM"),
            Self::ChrRom(banks) => write!(f, "{} KiB", u32::from(*banks) * 8),
            Self::Mapper(mapper) => write!(f, "{mapper}"),
            Self::Mirroring(mirroring) => write!(f, "{mirroring}"),
            Self::Battery(true) => write!(f, "yes"),
            Self::Battery(false) => write!(f, "no"),
            Self::Missing => write!(f, "none"),
        }
    }
}

/// One field where the observed header disagrees with the canonical profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct Discrepancy {
    pub field: Field,
    pub expected: FieldValue,
    pub observed: FieldValue,
}

impl std::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {}, read {}",
            self.field.label(),
            self.expected,
            self.observed
        )
    }
}

/// Compare an observed header against the canonical profile.
///
/// Compares PRG ROM, CHR ROM, mapper, mirroring, and battery, in that order;
/// the ordering is part of the report contract. Fields the profile does not
/// track (TV system, trainer, arcade flags) are never compared. When no
/// header is present every compared field is reported against
/// [`FieldValue::Missing`].
#[must_use]
pub fn diff(observed: Option<&NesHeader>, canonical: &CanonicalProfile) -> Vec<Discrepancy> {
    let mut discrepancies = Vec::new();
    let mut push = |field, expected, observed| {
        if expected != observed {
            discrepancies.push(Discrepancy {
                field,
                expected,
                observed,
            });
        }
    };
    match observed {
        Some(header) => {
            push(
                Field::PrgRom,
                FieldValue::PrgRom(canonical.prg_rom_banks),
                FieldValue::PrgRom(header.prg_rom_banks),
            );
            push(
                Field::ChrRom,
                FieldValue::ChrRom(canonical.chr_rom_banks),
                FieldValue::ChrRom(header.chr_rom_banks),
            );
            push(
                Field::Mapper,
                FieldValue::Mapper(canonical.mapper_num),
                FieldValue::Mapper(header.mapper_num),
            );
            push(
                Field::Mirroring,
                FieldValue::Mirroring(canonical.mirroring),
                FieldValue::Mirroring(header.mirroring),
            );
            push(
                Field::Battery,
                FieldValue::Battery(canonical.battery),
                FieldValue::Battery(header.battery),
            );
        }
        None => {
            push(
                Field::PrgRom,
                FieldValue::PrgRom(canonical.prg_rom_banks),
                FieldValue::Missing,
            );
            push(
                Field::ChrRom,
                FieldValue::ChrRom(canonical.chr_rom_banks),
                FieldValue::Missing,
            );
            push(
                Field::Mapper,
                FieldValue::Mapper(canonical.mapper_num),
                FieldValue::Missing,
            );
            push(
                Field::Mirroring,
                FieldValue::Mirroring(canonical.mirroring),
                FieldValue::Missing,
            );
            push(
                Field::Battery,
                FieldValue::Battery(canonical.battery),
                FieldValue::Missing,
            );
        }
    }
    discrepancies
}

/// Produce the corrected header: compared fields come from the profile,
/// everything else is preserved from the observed header. When no header was
/// present the uncompared fields take their defaults (NTSC, no trainer, no
/// arcade flags, unspecified PRG RAM).
pub fn merge(observed: Option<&NesHeader>, canonical: &CanonicalProfile) -> NesHeader {
    let base = observed.copied().unwrap_or_default();
    NesHeader {
        prg_rom_banks: canonical.prg_rom_banks,
        chr_rom_banks: canonical.chr_rom_banks,
        mapper_num: canonical.mapper_num,
        mirroring: canonical.mirroring,
        battery: canonical.battery,
        ..base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::TvSystem;

    fn canonical() -> CanonicalProfile {
        CanonicalProfile {
            prg_rom_banks: 8,
            chr_rom_banks: 0,
            prg_ram_banks: 1,
            mapper_num: 1,
            mirroring: Mirroring::Vertical,
            battery: true,
        }
    }

    fn matching_header() -> NesHeader {
        NesHeader {
            prg_rom_banks: 8,
            chr_rom_banks: 0,
            prg_ram_banks: 2,
            mapper_num: 1,
            mirroring: Mirroring::Vertical,
            tv_system: TvSystem::Pal,
            battery: true,
            ..NesHeader::default()
        }
    }

    #[test]
    fn matching_header_has_no_discrepancies() {
        assert!(diff(Some(&matching_header()), &canonical()).is_empty());
    }

    #[test]
    fn discrepancies_are_reported_in_field_order() {
        let observed = NesHeader {
            prg_rom_banks: 4,
            chr_rom_banks: 2,
            mapper_num: 0,
            mirroring: Mirroring::Horizontal,
            battery: false,
            ..NesHeader::default()
        };
        let fields = diff(Some(&observed), &canonical())
            .into_iter()
            .map(|d| d.field)
            .collect::<Vec<_>>();
        assert_eq!(
            fields,
            [
                Field::PrgRom,
                Field::ChrRom,
                Field::Mapper,
                Field::Mirroring,
                Field::Battery
            ]
        );
    }

    #[test]
    fn uncompared_fields_are_never_diffed() {
        let observed = NesHeader {
            prg_ram_banks: 4,
            tv_system: TvSystem::Pal,
            trainer: true,
            playchoice_10: true,
            vs_unisystem: true,
            ..matching_header()
        };
        assert!(diff(Some(&observed), &canonical()).is_empty());
    }

    #[test]
    fn missing_header_reports_every_compared_field() {
        let discrepancies = diff(None, &canonical());
        assert_eq!(discrepancies.len(), 5);
        assert!(discrepancies
            .iter()
            .all(|d| d.observed == FieldValue::Missing));
    }

    #[test]
    fn merge_overwrites_compared_fields_only() {
        let observed = NesHeader {
            prg_rom_banks: 4,
            chr_rom_banks: 2,
            prg_ram_banks: 3,
            mapper_num: 66,
            mirroring: Mirroring::Horizontal,
            tv_system: TvSystem::Pal,
            battery: false,
            trainer: true,
            playchoice_10: true,
            vs_unisystem: false,
        };
        let merged = merge(Some(&observed), &canonical());
        assert_eq!(merged.prg_rom_banks, 8);
        assert_eq!(merged.chr_rom_banks, 0);
        assert_eq!(merged.mapper_num, 1);
        assert_eq!(merged.mirroring, Mirroring::Vertical);
        assert!(merged.battery);
        // untouched
        assert_eq!(merged.prg_ram_banks, 3);
        assert_eq!(merged.tv_system, TvSystem::Pal);
        assert!(merged.trainer);
        assert!(merged.playchoice_10);
        assert!(!merged.vs_unisystem);
    }

    #[test]
    fn merge_synthesizes_defaults_without_a_header() {
        let merged = merge(None, &canonical());
        assert_eq!(merged.prg_rom_banks, 8);
        assert_eq!(merged.prg_ram_banks, 0);
        assert_eq!(merged.tv_system, TvSystem::Ntsc);
        assert!(!merged.trainer);
        assert!(!merged.playchoice_10);
        assert!(!merged.vs_unisystem);
    }

    #[test]
    fn merge_is_idempotent() {
        let observed = NesHeader::default();
        let merged = merge(Some(&observed), &canonical());
        assert!(diff(Some(&merged), &canonical()).is_empty());
        assert_eq!(merge(Some(&merged), &canonical()), merged);
    }

    #[test]
    fn empty_diff_means_merge_preserves_compared_fields() {
        let observed = matching_header();
        assert!(diff(Some(&observed), &canonical()).is_empty());
        let merged = merge(Some(&observed), &canonical());
        assert_eq!(merged.prg_rom_banks, observed.prg_rom_banks);
        assert_eq!(merged.chr_rom_banks, observed.chr_rom_banks);
        assert_eq!(merged.mapper_num, observed.mapper_num);
        assert_eq!(merged.mirroring, observed.mirroring);
        assert_eq!(merged.battery, observed.battery);
    }

    #[test]
    fn discrepancy_rendering() {
        let discrepancy = Discrepancy {
            field: Field::PrgRom,
            expected: FieldValue::PrgRom(2),
            observed: FieldValue::Missing,
        };
        assert_eq!(discrepancy.to_string(), "PRG ROM: expected 32 KiB, read none");

        let discrepancy = Discrepancy {
            field: Field::ChrRom,
            expected: FieldValue::ChrRom(0),
            observed: FieldValue::ChrRom(1),
        };
        assert_eq!(discrepancy.to_string(), "CHR ROM: expected CHR RAM, read 8 KiB");
    }
}
