//! Cartridge profile database.
//!
//! Maps a payload CRC-32 to the canonical header fields for that cartridge,
//! loaded once from a NstDatabase-style XML file. The mapping is immutable
//! after load and safe for unsynchronized concurrent reads.

use crate::header::Mirroring;
use quick_xml::{events::BytesStart, Reader};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, warn};

const PRG_BANK_SIZE: u64 = 16 * 1024;
const CHR_BANK_SIZE: u64 = 8 * 1024;
const PRG_RAM_BANK_SIZE: u64 = 8 * 1024;

// Boards wired for four-screen mirroring (Gauntlet, Rad Racer II, Napoleon
// Senki, plus a couple of names that only appear in emulator sources).
const FOUR_SCREEN_BOARDS: &[&str] = &[
    "NES-DRROM",
    "NES-TR1ROM",
    "TENGEN-800004",
    "NES-TVROM",
    "IREM-74*161/161/21/138",
    "HVC-DRROM",
    "HVC-TVROM",
];

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[must_use]
pub enum Error {
    #[error("failed to read database {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed database: {0}")]
    Malformed(String),
}

impl Error {
    fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Canonical header fields for one cartridge, keyed by payload CRC-32.
///
/// TV system, trainer, and arcade flags are absent: the source database does
/// not track them reliably, so they are never reconciled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct CanonicalProfile {
    pub prg_rom_banks: u16,
    pub chr_rom_banks: u16,
    pub prg_ram_banks: u16,
    pub mapper_num: u16,
    pub mirroring: Mirroring,
    pub battery: bool,
}

/// An immutable CRC-32 keyed profile database.
#[derive(Debug, Default, Clone)]
#[must_use]
pub struct GameDb {
    games: HashMap<u32, CanonicalProfile>,
}

impl GameDb {
    /// Load a database from a NstDatabase-style XML file.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Unreadable`] when the file cannot be opened and
    /// [`Error::Malformed`] when its contents cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self::from_reader(BufReader::new(file))?;
        info!("loaded {} profiles from {path:?}", db.len());
        Ok(db)
    }

    /// Parse a database from any XML source.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Malformed`] when the XML or any entry in it cannot
    /// be parsed.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        use quick_xml::events::Event;

        let mut reader = Reader::from_reader(reader);
        let mut games = HashMap::new();
        let mut pending: Option<PendingEntry> = None;
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Err(err) => {
                    return Err(Error::malformed(format!(
                        "xml error at byte {}: {err}",
                        reader.buffer_position()
                    )))
                }
                Ok(Event::Eof) => break,
                Ok(Event::Start(elem)) => {
                    match elem.name().as_ref() {
                        b"cartridge" | b"arcade" => pending = Some(PendingEntry::open(&elem)?),
                        _ => {
                            if let Some(entry) = &mut pending {
                                entry.child(&elem)?;
                            }
                        }
                    };
                }
                Ok(Event::Empty(elem)) => {
                    if let Some(entry) = &mut pending {
                        entry.child(&elem)?;
                    }
                }
                Ok(Event::End(elem)) => {
                    if matches!(elem.name().as_ref(), b"cartridge" | b"arcade") {
                        if let Some(entry) = pending.take() {
                            entry.close(&mut games)?;
                        }
                    }
                }
                Ok(_) => {}
            }
            buf.clear();
        }
        Ok(Self { games })
    }

    /// Look up the canonical profile for a payload checksum. `None` is a
    /// normal outcome: most dumps are absent from any given database.
    #[must_use]
    pub fn get(&self, crc32: u32) -> Option<&CanonicalProfile> {
        self.games.get(&crc32)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

/// One `<cartridge>`/`<arcade>` element being accumulated.
#[derive(Debug)]
struct PendingEntry {
    crc32: u32,
    saw_board: bool,
    board_type: Option<String>,
    mapper_num: u16,
    prg_bytes: u64,
    chr_bytes: u64,
    wram_bytes: u64,
    battery: bool,
    pads: Option<(bool, bool)>,
}

impl PendingEntry {
    fn open(elem: &BytesStart<'_>) -> Result<Self> {
        let crc = attr_value(elem, b"crc")?
            .ok_or_else(|| Error::malformed("cartridge entry without a crc attribute"))?;
        let crc32 = u32::from_str_radix(&crc, 16)
            .map_err(|_| Error::malformed(format!("invalid crc attribute {crc:?}")))?;
        Ok(Self {
            crc32,
            saw_board: false,
            board_type: None,
            mapper_num: 0,
            prg_bytes: 0,
            chr_bytes: 0,
            wram_bytes: 0,
            battery: false,
            pads: None,
        })
    }

    fn child(&mut self, elem: &BytesStart<'_>) -> Result<()> {
        let crc32 = self.crc32;
        match elem.name().as_ref() {
            b"board" => {
                if self.saw_board {
                    return Err(Error::malformed(format!(
                        "multiple board elements for crc {crc32:08X}"
                    )));
                }
                self.saw_board = true;
                self.board_type = attr_value(elem, b"type")?;
                self.mapper_num = match attr_value(elem, b"mapper")? {
                    Some(mapper) => mapper.parse().map_err(|_| {
                        Error::malformed(format!(
                            "invalid mapper {mapper:?} for crc {crc32:08X}"
                        ))
                    })?,
                    None => 0,
                };
            }
            b"prg" => self.prg_bytes += size_attr(elem, crc32)?,
            b"chr" => self.chr_bytes += size_attr(elem, crc32)?,
            b"wram" => self.wram_bytes += size_attr(elem, crc32)?,
            b"pad" => {
                if self.pads.is_some() {
                    return Err(Error::malformed(format!(
                        "multiple pad elements for crc {crc32:08X}"
                    )));
                }
                let h = attr_value(elem, b"h")?.as_deref() == Some("1");
                let v = attr_value(elem, b"v")?.as_deref() == Some("1");
                if h == v {
                    return Err(Error::malformed(format!(
                        "expected exactly one of the h/v solder pads for crc {crc32:08X}"
                    )));
                }
                self.pads = Some((h, v));
            }
            _ => {}
        }
        // The battery attribute may sit on any element under the board.
        if attr_value(elem, b"battery")?.as_deref() == Some("1") {
            self.battery = true;
        }
        Ok(())
    }

    fn close(self, games: &mut HashMap<u32, CanonicalProfile>) -> Result<()> {
        let crc32 = self.crc32;
        if !self.saw_board {
            return Err(Error::malformed(format!(
                "missing board element for crc {crc32:08X}"
            )));
        }

        let mirroring = self.mirroring()?;
        let (Some(prg_rom_banks), Some(chr_rom_banks)) = (
            whole_banks(self.prg_bytes, PRG_BANK_SIZE),
            whole_banks(self.chr_bytes, CHR_BANK_SIZE),
        ) else {
            warn!(
                "skipping crc {crc32:08X}: rom sizes not representable in header banks \
                 (prg: {}, chr: {})",
                self.prg_bytes, self.chr_bytes
            );
            return Ok(());
        };
        // Some boards carry RAM that isn't a whole number of 8 KiB banks
        // (Crisis Force has 2 KiB). Rounding up beats writing zero.
        let wram_banks = self.wram_bytes.div_ceil(PRG_RAM_BANK_SIZE);
        let Ok(prg_ram_banks) = u16::try_from(wram_banks) else {
            warn!("skipping crc {crc32:08X}: prg-ram too large ({} bytes)", self.wram_bytes);
            return Ok(());
        };

        let profile = CanonicalProfile {
            prg_rom_banks,
            chr_rom_banks,
            prg_ram_banks,
            mapper_num: self.mapper_num,
            mirroring,
            battery: self.battery,
        };
        match games.get(&crc32) {
            Some(existing) if *existing == profile => {
                debug!("duplicate identical entries for crc {crc32:08X}");
            }
            Some(_) => {
                warn!(
                    "multiple different database entries for crc {crc32:08X}, \
                     ignoring entries after the first"
                );
            }
            None => {
                games.insert(crc32, profile);
            }
        }
        Ok(())
    }

    fn mirroring(&self) -> Result<Mirroring> {
        let four_screen = self
            .board_type
            .as_deref()
            .is_some_and(|board| FOUR_SCREEN_BOARDS.contains(&board));
        if four_screen {
            if self.pads.is_some() {
                return Err(Error::malformed(format!(
                    "solder pads set on four-screen board for crc {:08X}",
                    self.crc32
                )));
            }
            return Ok(Mirroring::FourScreen);
        }
        match self.pads {
            // No pads means the mapper controls mirroring; Horizontal is the
            // value that ends up encoded in that case.
            None => Ok(Mirroring::Horizontal),
            Some((true, _)) => Ok(Mirroring::Vertical),
            Some((_, true)) => Ok(Mirroring::Horizontal),
            Some(_) => unreachable!("pads validated on parse"),
        }
    }
}

fn attr_value(elem: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in elem.attributes() {
        let attr = attr.map_err(|err| Error::malformed(format!("invalid attribute: {err}")))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|err| Error::malformed(format!("invalid attribute value: {err}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn size_attr(elem: &BytesStart<'_>, crc32: u32) -> Result<u64> {
    let Some(size) = attr_value(elem, b"size")? else {
        return Ok(0);
    };
    let Some(kib) = size.strip_suffix('k').and_then(|n| n.parse::<u64>().ok()) else {
        return Err(Error::malformed(format!(
            "can't parse size {size:?} for crc {crc32:08X}"
        )));
    };
    Ok(kib * 1024)
}

fn whole_banks(bytes: u64, bank_size: u64) -> Option<u16> {
    if bytes % bank_size != 0 {
        return None;
    }
    u16::try_from(bytes / bank_size).ok()
}
