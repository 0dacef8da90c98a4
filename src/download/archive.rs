//! Zip extraction for toolchain packages.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use zip::ZipArchive;

/// Extract `archive_path` into `dest`, returning the number of files written.
///
/// The whole archive is checked first: it must open, and every entry must
/// have a name that stays inside `dest`. Nothing is written if either check
/// fails.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open {}", archive_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("{} is not a valid zip archive", archive_path.display()))?;

    let mut entries: Vec<PathBuf> = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read entry {} of {}", i, archive_path.display()))?;
        let Some(name) = entry.enclosed_name() else {
            bail!(
                "{} contains an entry with an unsafe path: {}",
                archive_path.display(),
                entry.name()
            );
        };
        entries.push(name);
    }

    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory: {}", dest.display()))?;

    let mut written = 0;
    for (i, name) in entries.into_iter().enumerate() {
        let mut entry = archive.by_index(i)?;
        let out_path = dest.join(name);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("Failed to create {}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut outfile = File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;
        io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("Failed to extract {}", out_path.display()))?;
        written += 1;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                let _ = fs::set_permissions(&out_path, fs::Permissions::from_mode(mode));
            }
        }
    }

    tracing::debug!(
        "Extracted {} files from {} to {}",
        written,
        archive_path.display(),
        dest.display()
    );
    Ok(written)
}
