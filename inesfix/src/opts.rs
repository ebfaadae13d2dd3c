//! CLI options.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `inesfix` CLI options.
#[derive(Parser, Debug)]
#[command(version, author, about, long_about = None)]
#[must_use]
pub struct Opts {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
#[must_use]
pub enum Command {
    /// Print iNES headers without modifying anything.
    Read {
        /// ROM files, or zip archives containing ROMs.
        #[arg(required = true)]
        roms: Vec<PathBuf>,
    },
    /// Add or correct iNES headers from a cartridge database.
    Write {
        /// Path to the cartridge database XML.
        #[arg(short, long, default_value = "NstDatabase.xml")]
        db: PathBuf,
        /// Report what would change without modifying any file.
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// ROM files, or zip archives containing ROMs.
        #[arg(required = true)]
        roms: Vec<PathBuf>,
    },
}
