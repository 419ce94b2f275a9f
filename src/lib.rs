//! # radioquery
//!
//! Retrieve FITS image cutouts from radio sky surveys.
//!
//! ## Design Philosophy
//!
//! radioquery is designed to be:
//! - **One call per cutout** - `download_image` returns a result, never an error, for archive trouble
//! - **Idempotent** - Repeating a request reuses the file already on disk
//! - **Safe on disk** - A file at the reported path is always a complete, validated image
//! - **Library-first** - The surveys are adapters behind one trait
//!
//! Supported surveys are FIRST, NVSS, LoTSS DR2 and the VLASS quicklook tiles.
//!
//! ## Quick Start
//!
//! ```no_run
//! use radioquery::{CutoutQuery, SkyPosition, Survey};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let position = SkyPosition::from_sexagesimal("10h50m07.270s", "+30d40m37.52s")?;
//!     let query = CutoutQuery::new(Survey::First, position, 5.0)?;
//!
//!     let (path, success) = query.download_image().await.into_tuple();
//!     if success {
//!         println!("cutout at {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Sky coordinate rendering and parsing
pub mod coords;
/// Error types
pub mod error;
/// HTTP download, validation and atomic publication
pub mod executor;
/// FITS signature checks
pub mod fits;
/// Caller-facing cutout query
pub mod query;
/// Retry logic with exponential backoff
pub mod retry;
/// Survey adapters
pub mod survey;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, HttpConfig, RetryConfig, TileIndexSource, VlassConfig};
pub use coords::{CoordinateEncoding, CoordinateFormatter, FormattedPosition, SexagesimalStyle};
pub use error::{Error, ErrorDetail, ErrorKind, Result};
pub use executor::{DownloadExecutor, DownloadOutcome};
pub use query::{CutoutQuery, DEFAULT_SIZE_ARCMIN};
pub use survey::{
    Delivery, FirstAdapter, HttpRequestSpec, LotssAdapter, NvssAdapter, SurveyAdapter,
    SurveyEndpoint, TileIndex, VlassAdapter,
};
pub use types::{CutoutRequest, CutoutResult, SkyPosition, Survey};

/// Fetch one cutout with the default configuration
///
/// The artifact is placed under `<destination_root>/<SURVEY>/`, or under the
/// default output root when `destination_root` is `None`. Convenience wrapper
/// around [`CutoutQuery::download_image`].
///
/// # Errors
///
/// Only construction errors are returned; download failures are reported in
/// the [`CutoutResult`].
pub async fn download_image(
    survey: Survey,
    position: SkyPosition,
    size_arcmin: f64,
    destination_root: Option<&std::path::Path>,
    overwrite: bool,
) -> Result<CutoutResult> {
    let mut config = Config::default();
    if let Some(root) = destination_root {
        config.output_root = root.to_path_buf();
    }
    let query = CutoutQuery::with_config(survey, position, size_arcmin, config)?.overwrite(overwrite);
    Ok(query.download_image().await)
}
