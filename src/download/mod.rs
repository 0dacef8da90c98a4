//! Installer acquisition: version resolution, release metadata, HTTP
//! downloads, and archive extraction.

pub mod archive;
pub mod fetch;
pub mod metadata;
pub mod resolver;

pub use archive::extract_zip;
pub use fetch::{file_sha256, FetchedFile, Fetcher, HttpFetcher, StaticFetcher};
pub use metadata::{
    parse_cycles, EndOfLifeClient, ReleaseCycle, ReleaseMetadata, StaticMetadata,
    DEFAULT_METADATA_URL,
};
pub use resolver::{
    DownloadResolver, DownloadTarget, OsFilter, DEFAULT_DOWNLOAD_BASE, DEFAULT_FALLBACK_URL,
};
