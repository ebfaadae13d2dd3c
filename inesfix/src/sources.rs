//! ROM input sources: plain files and zip archives.

use anyhow::Context;
use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};
use tracing::warn;
use zip::ZipArchive;

// Largest archive member read into memory. Generous for any iNES image.
const MAX_MEMBER_SIZE: u64 = 4 * 1024 * 1024;

#[derive(Debug)]
enum Origin {
    File(PathBuf),
    Archived,
}

/// One ROM image gathered from disk, read fully into memory.
#[derive(Debug)]
#[must_use]
pub struct Source {
    name: String,
    bytes: Vec<u8>,
    origin: Origin,
}

impl Source {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Persist a corrected image back to where this source came from,
    /// replacing the original file only once the new bytes are fully written.
    ///
    /// Returns `false` when the source cannot be updated: archive members are
    /// read-only.
    pub fn write_back(&self, bytes: &[u8]) -> anyhow::Result<bool> {
        let Origin::File(path) = &self.origin else {
            warn!("cannot update roms inside archives: {}", self.name);
            return Ok(false);
        };
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).with_context(|| format!("failed to write {tmp:?}"))?;
        if let Err(err) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(err).with_context(|| format!("failed to replace {path:?}"));
        }
        Ok(true)
    }
}

/// Gather the ROM images behind one CLI path argument.
///
/// # Errors
///
/// Fails when the path itself cannot be read. Unreadable or oversized archive
/// members are skipped with a warning instead.
pub fn gather(path: &Path) -> anyhow::Result<Vec<Source>> {
    let is_zip = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if is_zip {
        gather_zip(path)
    } else {
        gather_file(path)
    }
}

fn gather_file(path: &Path) -> anyhow::Result<Vec<Source>> {
    let bytes = fs::read(path).with_context(|| format!("failed to read rom {path:?}"))?;
    Ok(vec![Source {
        name: path.display().to_string(),
        bytes,
        origin: Origin::File(path.to_path_buf()),
    }])
}

fn gather_zip(path: &Path) -> anyhow::Result<Vec<Source>> {
    let file = fs::File::open(path).with_context(|| format!("failed to open archive {path:?}"))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("failed to read archive {path:?}"))?;
    let mut sources = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut member = match archive.by_index(index) {
            Ok(member) => member,
            Err(err) => {
                warn!("can't read member {index} within {path:?}: {err}");
                continue;
            }
        };
        if member.is_dir() {
            continue;
        }
        let name = format!("{}/{}", path.display(), member.name());
        if member.size() > MAX_MEMBER_SIZE {
            warn!("skipping {name}: too big ({} bytes)", member.size());
            continue;
        }
        let mut bytes = Vec::with_capacity(member.size() as usize);
        if let Err(err) = member.read_to_end(&mut bytes) {
            warn!("can't read {name}: {err}");
            continue;
        }
        sources.push(Source {
            name,
            bytes,
            origin: Origin::Archived,
        });
    }
    Ok(sources)
}
