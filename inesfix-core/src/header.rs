//! iNES header codec.
//!
//! The first 16 bytes of a `.nes` file describe how the cartridge payload is
//! laid out: PRG/CHR sizes, mapper number, nametable mirroring, and a few
//! hardware flags.
//!
//! <http://wiki.nesdev.com/w/index.php/INES>

use bitflags::bitflags;
use thiserror::Error;

/// Magic signature every headered `.nes` file starts with.
pub const MAGIC: [u8; 4] = *b"NES\x1a";
/// Signature of the UNIF container format, which this crate does not parse.
pub const UNIF_MAGIC: [u8; 4] = *b"UNIF";
/// Size of the fixed iNES header in bytes.
pub const HEADER_LEN: usize = 16;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[must_use]
pub enum Error {
    #[error("malformed nes header (found ${value:02X} at byte {byte}). {message}")]
    Malformed {
        byte: u8,
        value: u8,
        message: String,
    },
    #[error("{0} roms are currently unsupported")]
    Unsupported(RomFormat),
    #[error("can't represent {field} value `{value}` in an ines header")]
    FieldOutOfRange { field: &'static str, value: u16 },
}

impl Error {
    fn malformed(byte: u8, value: u8, message: impl Into<String>) -> Self {
        Self::Malformed {
            byte,
            value,
            message: message.into(),
        }
    }
}

/// Header flavors that are recognized but not parsed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub enum RomFormat {
    Unif,
    Nes2,
}

impl AsRef<str> for RomFormat {
    fn as_ref(&self) -> &str {
        match self {
            Self::Unif => "UNIF",
            Self::Nes2 => "NES 2.0",
        }
    }
}

impl std::fmt::Display for RomFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

bitflags! {
    /// iNES flags 6: mirroring, battery, trainer, four-screen, mapper low nibble.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    struct Flags6: u8 {
        const MIRRORING   = 0x01;
        const BATTERY     = 0x02;
        const TRAINER     = 0x04;
        const FOUR_SCREEN = 0x08;
        const MAPPER_LOW  = 0xF0;
    }
}

bitflags! {
    /// iNES flags 7: console variants, format version, mapper high nibble.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    struct Flags7: u8 {
        const VS_UNISYSTEM  = 0x01;
        const PLAYCHOICE_10 = 0x02;
        const FORMAT        = 0x0C;
        const MAPPER_HIGH   = 0xF0;
    }
}

/// Hardware nametable mirroring.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub enum Mirroring {
    #[default]
    Horizontal,
    Vertical,
    FourScreen,
}

impl AsRef<str> for Mirroring {
    fn as_ref(&self) -> &str {
        match self {
            Self::Horizontal => "Horizontal",
            Self::Vertical => "Vertical",
            Self::FourScreen => "Four screen",
        }
    }
}

impl std::fmt::Display for Mirroring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// TV system hint. Many real-world headers do not encode this reliably.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub enum TvSystem {
    #[default]
    Ntsc,
    Pal,
}

impl AsRef<str> for TvSystem {
    fn as_ref(&self) -> &str {
        match self {
            Self::Ntsc => "NTSC",
            Self::Pal => "PAL",
        }
    }
}

impl std::fmt::Display for TvSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// A decoded iNES header.
///
/// Sizes are stored in header units: 16 KiB banks for PRG ROM, 8 KiB banks
/// for CHR ROM and PRG RAM. `chr_rom_banks == 0` means the board uses CHR RAM
/// instead of CHR ROM. `prg_ram_banks == 0` leaves the size unspecified and
/// consumers assume a single 8 KiB bank.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct NesHeader {
    pub prg_rom_banks: u16,
    pub chr_rom_banks: u16,
    pub prg_ram_banks: u16,
    pub mapper_num: u16,
    pub mirroring: Mirroring,
    pub tv_system: TvSystem,
    pub battery: bool,
    pub trainer: bool,
    pub playchoice_10: bool,
    pub vs_unisystem: bool,
}

impl NesHeader {
    /// Decode the header at the start of `bytes`.
    ///
    /// Returns `Ok(None)` when no header is present (the payload is the whole
    /// file). A pure function of the first [`HEADER_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// Fails on UNIF and NES 2.0 signatures, on corrupt format-version bits,
    /// and on nonzero reserved bits or conflicting mirroring bits.
    pub fn decode(bytes: &[u8]) -> Result<Option<Self>> {
        if bytes.len() >= UNIF_MAGIC.len() && bytes[..UNIF_MAGIC.len()] == UNIF_MAGIC {
            return Err(Error::Unsupported(RomFormat::Unif));
        }
        if bytes.len() < HEADER_LEN || bytes[..MAGIC.len()] != MAGIC {
            return Ok(None);
        }

        let flags6 = Flags6::from_bits_truncate(bytes[6]);
        let flags7 = Flags7::from_bits_truncate(bytes[7]);

        match bytes[7] & Flags7::FORMAT.bits() {
            0x08 => return Err(Error::Unsupported(RomFormat::Nes2)),
            0x04 | 0x0C => {
                return Err(Error::malformed(
                    7,
                    bytes[7],
                    "format version bits are corrupt (likely overwritten by an old tool). repair and try again",
                ));
            }
            _ => {}
        }

        // The extension bytes are undefined in iNES. Old tools wrote junk
        // there, which makes the rest of the header untrustworthy.
        if bytes[9] & 0xFE != 0 {
            return Err(Error::malformed(
                9,
                bytes[9],
                "reserved bits set in tv system byte",
            ));
        }
        for (i, value) in bytes.iter().enumerate().take(HEADER_LEN).skip(10) {
            if *value > 0 {
                return Err(Error::malformed(
                    i as u8,
                    *value,
                    format!("unrecognized data found at header byte {i}. repair and try again"),
                ));
            }
        }

        let mirroring = if flags6.contains(Flags6::FOUR_SCREEN) {
            if flags6.contains(Flags6::MIRRORING) {
                return Err(Error::malformed(
                    6,
                    bytes[6],
                    "four-screen and vertical mirroring bits are both set",
                ));
            }
            Mirroring::FourScreen
        } else if flags6.contains(Flags6::MIRRORING) {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        // Upper 4 bits of flags 6 = D0..D3, upper 4 bits of flags 7 = D4..D7
        let mapper_num = u16::from(((bytes[6] & 0xF0) >> 4) | (bytes[7] & 0xF0));
        let tv_system = if bytes[9] & 0x01 == 0x01 {
            TvSystem::Pal
        } else {
            TvSystem::Ntsc
        };

        Ok(Some(Self {
            prg_rom_banks: u16::from(bytes[4]),
            chr_rom_banks: u16::from(bytes[5]),
            prg_ram_banks: u16::from(bytes[8]),
            mapper_num,
            mirroring,
            tv_system,
            battery: flags6.contains(Flags6::BATTERY),
            trainer: flags6.contains(Flags6::TRAINER),
            playchoice_10: flags7.contains(Flags7::PLAYCHOICE_10),
            vs_unisystem: flags7.contains(Flags7::VS_UNISYSTEM),
        }))
    }

    /// Encode this header into its 16-byte wire form. Reserved bytes are
    /// written as zero.
    ///
    /// # Errors
    ///
    /// Fails when any field exceeds the width of its header field.
    pub fn encode(&self) -> Result<[u8; 16]> {
        let prg_rom = Self::bank_byte("prg-rom banks", self.prg_rom_banks)?;
        let chr_rom = Self::bank_byte("chr-rom banks", self.chr_rom_banks)?;
        let prg_ram = Self::bank_byte("prg-ram banks", self.prg_ram_banks)?;
        if self.mapper_num > 0xFF {
            return Err(Error::FieldOutOfRange {
                field: "mapper",
                value: self.mapper_num,
            });
        }
        let mapper = self.mapper_num as u8;

        let mut flags6 = Flags6::from_bits_truncate((mapper & 0x0F) << 4);
        match self.mirroring {
            Mirroring::Horizontal => {}
            Mirroring::Vertical => flags6 |= Flags6::MIRRORING,
            Mirroring::FourScreen => flags6 |= Flags6::FOUR_SCREEN,
        }
        flags6.set(Flags6::BATTERY, self.battery);
        flags6.set(Flags6::TRAINER, self.trainer);

        let mut flags7 = Flags7::from_bits_truncate(mapper & 0xF0);
        flags7.set(Flags7::PLAYCHOICE_10, self.playchoice_10);
        flags7.set(Flags7::VS_UNISYSTEM, self.vs_unisystem);

        let mut header = [0x00; HEADER_LEN];
        header[..MAGIC.len()].copy_from_slice(&MAGIC);
        header[4] = prg_rom;
        header[5] = chr_rom;
        header[6] = flags6.bits();
        header[7] = flags7.bits();
        header[8] = prg_ram;
        header[9] = match self.tv_system {
            TvSystem::Ntsc => 0x00,
            TvSystem::Pal => 0x01,
        };
        Ok(header)
    }

    fn bank_byte(field: &'static str, value: u16) -> Result<u8> {
        u8::try_from(value).map_err(|_| Error::FieldOutOfRange { field, value })
    }

    /// Whether the board uses CHR RAM instead of CHR ROM.
    #[must_use]
    pub const fn uses_chr_ram(&self) -> bool {
        self.chr_rom_banks == 0
    }
}
