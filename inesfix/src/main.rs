//! Inspect and repair iNES headers from a cartridge database.
//!
//! USAGE:
//!     inesfix read <roms>...
//!     inesfix write [--db <path>] [--dry-run] <roms>...
//!
//! `read` prints each file's checksum and decoded header. `write` compares
//! each header against the database entry for the file's payload checksum,
//! reports every differing field, and rewrites the header in place (or
//! prepends one when the file has none). Files whose checksum is unknown to
//! the database are left untouched.

mod logging;
mod opts;
mod report;
mod sources;

use anyhow::Context;
use clap::Parser;
use inesfix_core::{db::GameDb, patch, reconcile, rom::Rom};
use opts::{Command, Opts};
use sources::Source;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

fn main() -> anyhow::Result<()> {
    logging::init();
    let opts = Opts::parse();
    debug!("CLI options: {opts:?}");

    match opts.command {
        Command::Read { roms } => cmd_read(&roms),
        Command::Write { db, dry_run, roms } => cmd_write(&db, dry_run, &roms),
    }
}

fn cmd_read(paths: &[PathBuf]) -> anyhow::Result<()> {
    for_each_source(paths, |source| {
        let rom = Rom::from_bytes(source.name(), source.bytes())?;
        report::print_rom(&rom);
        Ok(())
    });
    Ok(())
}

fn cmd_write(db_path: &Path, dry_run: bool, paths: &[PathBuf]) -> anyhow::Result<()> {
    let db = GameDb::load(db_path).context("failed to load cartridge database")?;
    for_each_source(paths, |source| write_one(&db, dry_run, source));
    Ok(())
}

/// Visit every ROM behind the given paths. Per-file failures are reported
/// and the batch continues; only argument-level failures abort a run.
fn for_each_source(paths: &[PathBuf], mut visit: impl FnMut(&Source) -> anyhow::Result<()>) {
    for path in paths {
        let sources = match sources::gather(path) {
            Ok(sources) => sources,
            Err(err) => {
                error!("{err:#}");
                continue;
            }
        };
        for source in &sources {
            if let Err(err) = visit(source) {
                warn!("{}: {err:#}", source.name());
            }
        }
    }
}

fn write_one(db: &GameDb, dry_run: bool, source: &Source) -> anyhow::Result<()> {
    let rom = Rom::from_bytes(source.name(), source.bytes())?;
    let Some(profile) = db.get(rom.crc32()) else {
        if rom.has_header() {
            println!("{rom}: not in database, skipping");
        } else {
            println!("{rom}: no header, not in database, cannot add header");
        }
        return Ok(());
    };

    let discrepancies = reconcile::diff(rom.header(), profile);
    if discrepancies.is_empty() {
        println!("{rom}: header matches database");
        return Ok(());
    }
    if rom.has_header() {
        println!("{rom}: header differs from database, will update header");
    } else {
        println!("{rom}: no header, will add header");
    }
    report::print_discrepancies(&discrepancies);
    if dry_run {
        return Ok(());
    }

    let corrected = reconcile::merge(rom.header(), profile);
    let patched = patch::apply(source.bytes(), &corrected)?;
    if source.write_back(&patched)? {
        debug!("{rom}: header updated");
    }
    Ok(())
}
