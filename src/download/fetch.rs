//! Installer downloads.
//!
//! Files are streamed to a `.part` sibling and renamed into place only once
//! complete, so a failed or interrupted download never leaves something that
//! looks like a finished installer.

use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// A completed download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedFile {
    pub path: PathBuf,
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the file contents.
    pub sha256: String,
}

/// Downloads a URL to a local path.
pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<FetchedFile>;
}

/// Streams HTTP downloads with an optional progress bar.
pub struct HttpFetcher {
    client: Client,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(600))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("kamek/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            show_progress: true,
        }
    }

    /// Hide the progress bar (quiet mode, non-terminal output).
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        match total {
            Some(len) => {
                let bar = ProgressBar::new(len);
                if let Ok(style) = ProgressStyle::with_template(
                    "  {bar:30.cyan/dim} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                ) {
                    bar.set_style(style);
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template("  {spinner} {bytes} ({bytes_per_sec})") {
                    bar.set_style(style);
                }
                bar
            }
        }
    }

    fn download(&self, url: &str, part: &Path) -> Result<(u64, String)> {
        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to connect to {}", url))?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }

        let bar = self.progress_bar(response.content_length());
        let file = File::create(part)
            .with_context(|| format!("Failed to create {}", part.display()))?;
        let mut writer = HashingWriter::new(bar.wrap_write(file));

        let bytes = response
            .copy_to(&mut writer)
            .with_context(|| format!("Failed while downloading {}", url))?;
        writer.flush()?;
        bar.finish_and_clear();

        Ok((bytes, writer.hex_digest()))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<FetchedFile> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let part = partial_path(dest);
        tracing::debug!("Downloading {} to {}", url, dest.display());

        let fetched = self.download(url, &part).and_then(|(bytes, sha256)| {
            fs::rename(&part, dest).with_context(|| {
                format!("Failed to rename {} to {}", part.display(), dest.display())
            })?;
            Ok(FetchedFile {
                path: dest.to_path_buf(),
                bytes,
                sha256,
            })
        });

        if fetched.is_err() {
            if let Err(rm) = fs::remove_file(&part) {
                if rm.kind() != io::ErrorKind::NotFound {
                    tracing::warn!("Could not remove partial file {}: {}", part.display(), rm);
                }
            }
        }
        fetched
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Hashes everything written through it.
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn hex_digest(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Writes a fixed body to every destination, or always fails.
///
/// Requested URLs are recorded for inspection.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    body: Option<Vec<u8>>,
    requested: RefCell<Vec<String>>,
}

impl StaticFetcher {
    pub fn serving(body: &[u8]) -> Self {
        Self {
            body: Some(body.to_vec()),
            requested: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<FetchedFile> {
        self.requested.borrow_mut().push(url.to_string());
        let Some(body) = &self.body else {
            bail!("connection refused fetching {}", url);
        };
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, body)?;
        Ok(FetchedFile {
            path: dest.to_path_buf(),
            bytes: body.len() as u64,
            sha256: file_sha256(dest)?,
        })
    }
}

/// SHA-256 of a file on disk, as lowercase hex.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
