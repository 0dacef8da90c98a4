//! Package snapshots and the transient migration manifest.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Specifiers from `pip freeze` output, in order.
///
/// Blank lines and comments are dropped. Everything else (pinned versions,
/// editable installs, direct references) is kept verbatim so that pip can
/// reinstall it.
pub fn parse_package_listing(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// A requirements file that exists only for the duration of one reinstall.
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    /// Write one specifier per line, UTF-8, into a fresh file under `dir`.
    pub fn write(dir: &Path, specifiers: &[String]) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let name = format!(
            "kamek-migration-{}-{}.txt",
            std::process::id(),
            chrono::Utc::now().format("%Y%m%d%H%M%S%3f")
        );
        let path = dir.join(name);

        let mut contents = specifiers.join("\n");
        contents.push('\n');
        fs::write(&path, contents)?;
        tracing::debug!("Wrote migration manifest {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the manifest. Failure is logged, never returned.
    pub fn remove(self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed migration manifest {}", self.path.display()),
            Err(e) => tracing::warn!(
                "Could not remove migration manifest {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
