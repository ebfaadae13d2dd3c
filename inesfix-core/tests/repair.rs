//! End-to-end repair pipeline: scan, look up, diff, merge, encode, patch.

use inesfix_core::{
    crc,
    db::GameDb,
    header::{self, NesHeader, HEADER_LEN, MAGIC},
    patch, reconcile,
    reconcile::FieldValue,
    rom::Rom,
};

fn db_for(crc32: u32) -> GameDb {
    let xml = format!(
        r#"<database version="1.0">
 <game>
  <cartridge system="NES-NTSC" crc="{crc32:08X}" sha1="00" dump="ok">
   <board type="NES-NROM-256" mapper="0">
    <prg size="32k"/>
    <chr size="8k"/>
    <pad h="1" v="0"/>
   </board>
  </cartridge>
 </game>
</database>"#
    );
    GameDb::from_reader(xml.as_bytes()).expect("valid database")
}

fn zeroed_header_rom(payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0x00; HEADER_LEN];
    bytes[..MAGIC.len()].copy_from_slice(&MAGIC);
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn zeroed_header_is_corrected_in_place() {
    let payload = vec![0x5A; 4096];
    let bytes = zeroed_header_rom(&payload);

    let rom = Rom::from_bytes("zeroed.nes", &bytes).expect("valid rom");
    let db = db_for(rom.crc32());
    let profile = db.get(rom.crc32()).expect("profile present");

    let discrepancies = reconcile::diff(rom.header(), profile);
    assert_eq!(discrepancies.len(), 3);
    assert_eq!(
        discrepancies[0].expected,
        FieldValue::PrgRom(profile.prg_rom_banks)
    );

    let corrected = reconcile::merge(rom.header(), profile);
    let patched = patch::apply(&bytes, &corrected).expect("patched");
    assert_eq!(patched[4], 0x02);
    assert_eq!(patched[5], 0x01);
    assert_eq!(patched[6] & 0x01, 0x01, "vertical mirroring bit");
    assert_eq!(&patched[HEADER_LEN..], &payload[..]);

    // The corrected file now matches the database.
    let rescanned = Rom::from_bytes("zeroed.nes", &patched).expect("valid rom");
    assert_eq!(rescanned.crc32(), rom.crc32());
    assert!(reconcile::diff(rescanned.header(), profile).is_empty());
}

#[test]
fn missing_header_is_synthesized_and_prepended() {
    let payload = vec![0xC3; 2048];
    let rom = Rom::from_bytes("bare.nes", &payload).expect("valid rom");
    assert!(!rom.has_header());

    let db = db_for(rom.crc32());
    let profile = db.get(rom.crc32()).expect("profile present");

    let discrepancies = reconcile::diff(rom.header(), profile);
    assert_eq!(discrepancies.len(), 5);
    assert!(discrepancies
        .iter()
        .all(|d| d.observed == FieldValue::Missing));

    let corrected = reconcile::merge(rom.header(), profile);
    let patched = patch::apply(&payload, &corrected).expect("patched");
    assert_eq!(patched.len(), HEADER_LEN + payload.len());
    assert_eq!(&patched[HEADER_LEN..], &payload[..]);

    let rescanned = Rom::from_bytes("bare.nes", &patched).expect("valid rom");
    assert!(rescanned.has_header());
    assert_eq!(rescanned.crc32(), rom.crc32(), "identity is stable");
    assert!(reconcile::diff(rescanned.header(), profile).is_empty());
}

#[test]
fn unknown_checksum_is_a_clean_miss() {
    let payload = vec![0x77; 1024];
    let rom = Rom::from_bytes("unknown.nes", &payload).expect("valid rom");
    let db = db_for(!rom.crc32());
    assert!(db.get(rom.crc32()).is_none());
}

#[test]
fn synthesized_trainer_header_cannot_be_inserted() {
    let payload = vec![0x01; 1024];
    let rom = Rom::from_bytes("bare.nes", &payload).expect("valid rom");
    let db = db_for(rom.crc32());
    let profile = db.get(rom.crc32()).expect("profile present");

    let corrected = NesHeader {
        trainer: true,
        ..reconcile::merge(rom.header(), profile)
    };
    let err = patch::apply(&payload, &corrected).expect_err("ambiguous payload boundary");
    assert!(matches!(err, patch::Error::TrainerWithoutHeader));
}

#[test]
fn malformed_headers_do_not_stop_a_batch() {
    let mut bad = zeroed_header_rom(&[0x11; 256]);
    bad[13] = b'!';
    let good = zeroed_header_rom(&[0x22; 256]);

    let scanned = [("bad.nes", &bad), ("good.nes", &good)]
        .into_iter()
        .map(|(name, bytes)| Rom::from_bytes(name, bytes))
        .collect::<Vec<_>>();

    assert!(matches!(
        scanned[0],
        Err(inesfix_core::rom::Error::Header(header::Error::Malformed {
            byte: 13,
            ..
        }))
    ));
    let good_rom = scanned[1].as_ref().expect("valid rom");
    assert_eq!(good_rom.crc32(), crc::checksum(&[0x22; 256]));
}
