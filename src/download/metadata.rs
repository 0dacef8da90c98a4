//! Release-cycle metadata for the interpreter.
//!
//! The default source is the endoflife.date API, which lists one entry per
//! release cycle with its latest patch version and an end-of-life marker.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::toolchain::VersionTuple;

/// Default release-metadata endpoint.
pub const DEFAULT_METADATA_URL: &str = "https://endoflife.date/api/python.json";

/// One release line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseCycle {
    /// Latest version in the cycle.
    pub version: VersionTuple,
    pub end_of_life: bool,
}

impl ReleaseCycle {
    pub fn new(version: VersionTuple, end_of_life: bool) -> Self {
        Self {
            version,
            end_of_life,
        }
    }
}

/// Source of release-cycle listings.
pub trait ReleaseMetadata {
    fn release_cycles(&self) -> Result<Vec<ReleaseCycle>>;
}

/// `eol` is either a flag or the date support ends.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EolField {
    Flag(bool),
    Date(NaiveDate),
}

impl EolField {
    fn is_past(&self, today: NaiveDate) -> bool {
        match self {
            EolField::Flag(flag) => *flag,
            EolField::Date(date) => *date <= today,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CycleEntry {
    latest: String,
    eol: EolField,
}

/// Parse an endoflife.date payload.
///
/// Entries whose `latest` is not a strict `X.Y.Z` are skipped; a payload
/// with no usable entries is an error.
pub fn parse_cycles(payload: &str, today: NaiveDate) -> Result<Vec<ReleaseCycle>> {
    let entries: Vec<CycleEntry> =
        serde_json::from_str(payload).context("Failed to parse release metadata")?;

    let cycles: Vec<ReleaseCycle> = entries
        .iter()
        .filter_map(|entry| {
            let version = VersionTuple::parse_strict(&entry.latest)?;
            Some(ReleaseCycle::new(version, entry.eol.is_past(today)))
        })
        .collect();

    if cycles.is_empty() {
        bail!("Release metadata contained no usable cycles");
    }
    Ok(cycles)
}

/// HTTP client for endoflife.date-shaped endpoints.
pub struct EndOfLifeClient {
    client: Client,
    url: String,
}

impl EndOfLifeClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, Duration::from_secs(30))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("kamek/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for EndOfLifeClient {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_URL)
    }
}

impl ReleaseMetadata for EndOfLifeClient {
    fn release_cycles(&self) -> Result<Vec<ReleaseCycle>> {
        tracing::debug!("Fetching release metadata from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .with_context(|| format!("Failed to reach {}", self.url))?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), self.url);
        }

        let body = response.text()?;
        parse_cycles(&body, chrono::Local::now().date_naive())
    }
}

/// Fixed cycle list, for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    cycles: Option<Vec<ReleaseCycle>>,
}

impl StaticMetadata {
    pub fn new(cycles: Vec<ReleaseCycle>) -> Self {
        Self {
            cycles: Some(cycles),
        }
    }

    /// A source that always fails, as if unreachable.
    pub fn unreachable() -> Self {
        Self { cycles: None }
    }
}

impl ReleaseMetadata for StaticMetadata {
    fn release_cycles(&self) -> Result<Vec<ReleaseCycle>> {
        match &self.cycles {
            Some(cycles) => Ok(cycles.clone()),
            None => bail!("release metadata unavailable"),
        }
    }
}
