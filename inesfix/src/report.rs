//! Console reporting.

use inesfix_core::{
    reconcile::{Discrepancy, FieldValue},
    rom::Rom,
};

/// Print the per-file header report.
pub fn print_rom(rom: &Rom) {
    let Some(header) = rom.header() else {
        println!("{rom}: no header");
        return;
    };
    println!("{rom}:");
    let rows = [
        (
            "PRG ROM",
            FieldValue::PrgRom(header.prg_rom_banks).to_string(),
        ),
        (
            "PRG RAM",
            format!("{} KiB", u32::from(header.prg_ram_banks) * 8),
        ),
        (
            "CHR ROM",
            FieldValue::ChrRom(header.chr_rom_banks).to_string(),
        ),
        ("Mapper", header.mapper_num.to_string()),
        ("Mirroring", header.mirroring.to_string()),
        ("TV System", header.tv_system.to_string()),
        ("Battery", yes_no(header.battery)),
        ("Trainer", yes_no(header.trainer)),
        ("PlayChoice-10", yes_no(header.playchoice_10)),
        ("VS UniSystem", yes_no(header.vs_unisystem)),
    ];
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in rows {
        println!("\t{label:<width$}: {value}");
    }
}

/// Print one line per discrepancy, in report order.
pub fn print_discrepancies(discrepancies: &[Discrepancy]) {
    for discrepancy in discrepancies {
        println!("\t{discrepancy}");
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}
