//! VLASS quicklook tile index
//!
//! Tiles are named after their centre, `JHHMMSS±DDMMSS_<suffix>.fits`. The
//! index is built from a directory listing (plain text, one name per line, or
//! the archive's HTML index page) and kept sorted by declination so that a
//! lookup only scans the band of tiles that can be within the cutoff.

use crate::config::{Config, TileIndexSource};
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::types::SkyPosition;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::{Mutex, OnceCell};

const TILE_NAME_PATTERN: &str =
    r"J(\d{2})(\d{2})(\d{2})([+-])(\d{2})(\d{2})(\d{2})[A-Za-z0-9_.+\-]*?\.fits";

/// Indexes loaded so far in this process, keyed by source
static SHARED: OnceLock<Mutex<HashMap<String, Arc<OnceCell<Arc<TileIndex>>>>>> = OnceLock::new();

/// One quicklook tile
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    /// File name in the tile directory
    pub name: String,
    /// Tile centre decoded from the name
    pub center: SkyPosition,
}

/// Result of a nearest-tile lookup
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileMatch<'a> {
    /// The selected tile
    pub tile: &'a Tile,
    /// Separation between target and tile centre, in degrees
    pub separation_deg: f64,
}

/// Nearest-tile lookup over the quicklook tile set
#[derive(Clone, Debug, Default)]
pub struct TileIndex {
    // sorted by (dec, name)
    tiles: Vec<Tile>,
}

/// Decode the centre encoded in a tile name
///
/// Returns `None` if the name does not start with `JHHMMSS±DDMMSS` or the
/// fields are out of range.
pub fn decode_tile_center(name: &str) -> Option<SkyPosition> {
    let bytes = name.as_bytes();
    if bytes.len() < 14 || bytes[0] != b'J' {
        return None;
    }
    let field = |start: usize| -> Option<f64> {
        name.get(start..start + 2)?.parse::<u8>().ok().map(f64::from)
    };
    let (hh, mm, ss) = (field(1)?, field(3)?, field(5)?);
    let sign = match bytes[7] {
        b'+' => 1.0,
        b'-' => -1.0,
        _ => return None,
    };
    let (dd, dm, ds) = (field(8)?, field(10)?, field(12)?);
    if mm >= 60.0 || ss >= 60.0 || dm >= 60.0 || ds >= 60.0 {
        return None;
    }

    let ra_deg = (hh + mm / 60.0 + ss / 3600.0) * 15.0;
    let dec_deg = sign * (dd + dm / 60.0 + ds / 3600.0);
    SkyPosition::new(ra_deg, dec_deg).ok()
}

impl TileIndex {
    /// Build an index from tiles in any order, dropping duplicate names
    pub fn from_tiles(mut tiles: Vec<Tile>) -> Self {
        tiles.sort_by(|a, b| a.name.cmp(&b.name));
        tiles.dedup_by(|a, b| a.name == b.name);
        tiles.sort_by(|a, b| {
            a.center
                .dec_deg()
                .total_cmp(&b.center.dec_deg())
                .then_with(|| a.name.cmp(&b.name))
        });
        Self { tiles }
    }

    /// Parse a plain or HTML directory listing
    ///
    /// # Errors
    ///
    /// Returns [`Error::TileIndex`] when the listing names no tiles.
    pub fn parse(listing: &str) -> Result<Self> {
        let pattern = Regex::new(TILE_NAME_PATTERN).map_err(|e| Error::TileIndex(e.to_string()))?;

        let mut skipped = 0usize;
        let tiles: Vec<Tile> = pattern
            .find_iter(listing)
            .filter_map(|m| {
                let name = m.as_str();
                match decode_tile_center(name) {
                    Some(center) => Some(Tile {
                        name: name.to_string(),
                        center,
                    }),
                    None => {
                        skipped += 1;
                        None
                    }
                }
            })
            .collect();

        if skipped > 0 {
            tracing::warn!(skipped, "ignored tile names with out-of-range centres");
        }
        if tiles.is_empty() {
            return Err(Error::TileIndex("listing contains no tile names".to_string()));
        }

        let index = Self::from_tiles(tiles);
        tracing::debug!(tiles = index.len(), "parsed tile listing");
        Ok(index)
    }

    /// Number of distinct tiles
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the index has no tiles
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles sorted by declination
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Find the tile whose centre is closest to `position`
    ///
    /// Ties on separation go to the tile whose name sorts first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCoverage`] when no tile centre lies within
    /// `max_separation_deg`, naming the nearest tile if there is one.
    pub fn nearest(&self, position: &SkyPosition, max_separation_deg: f64) -> Result<TileMatch<'_>> {
        let dec = position.dec_deg();
        // separation is never smaller than the declination difference
        let start = self
            .tiles
            .partition_point(|t| t.center.dec_deg() < dec - max_separation_deg);
        let band = self.tiles[start..]
            .iter()
            .take_while(|t| t.center.dec_deg() <= dec + max_separation_deg);

        if let Some(found) = closest(band, position)
            && found.separation_deg <= max_separation_deg
        {
            return Ok(found);
        }

        let nearest = closest(self.tiles.iter(), position)
            .map(|m| (m.tile.name.clone(), m.separation_deg));
        Err(Error::NoCoverage {
            ra_deg: position.ra_deg(),
            dec_deg: dec,
            nearest,
        })
    }

    /// Load an index from the configured source
    ///
    /// # Errors
    ///
    /// Returns [`Error::TileIndex`] for unreadable or empty listings, and
    /// network errors when the remote listing cannot be fetched.
    pub async fn load(config: &Config, client: &reqwest::Client) -> Result<Self> {
        match &config.vlass.tile_index {
            TileIndexSource::File(path) => {
                let listing = tokio::fs::read_to_string(path).await.map_err(|e| {
                    Error::TileIndex(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::parse(&listing)
            }
            TileIndexSource::Remote => {
                let url = &config.endpoints.vlass_tile_url;
                tracing::info!(url = %url, "fetching VLASS tile listing");
                let listing = with_retry(&config.retry, || fetch_listing(client, url, config)).await?;
                Self::parse(&listing)
            }
        }
    }

    /// Index for the configured source, loaded at most once per process
    ///
    /// Concurrent callers for one source wait for the first load; other
    /// sources are not blocked by it. A failed load is not cached, so a
    /// later call tries again.
    pub async fn shared(config: &Config, client: &reqwest::Client) -> Result<Arc<Self>> {
        let key = match &config.vlass.tile_index {
            TileIndexSource::File(path) => format!("file:{}", path.display()),
            TileIndexSource::Remote => format!("remote:{}", config.endpoints.vlass_tile_url),
        };

        let cell = {
            let cache = SHARED.get_or_init(|| Mutex::new(HashMap::new()));
            let mut cells = cache.lock().await;
            Arc::clone(cells.entry(key.clone()).or_default())
        };

        let index = cell
            .get_or_try_init(|| async {
                let index = Arc::new(Self::load(config, client).await?);
                tracing::info!(source = %key, tiles = index.len(), "VLASS tile index loaded");
                Ok::<_, Error>(index)
            })
            .await?;
        Ok(Arc::clone(index))
    }
}

fn closest<'a>(
    tiles: impl Iterator<Item = &'a Tile>,
    position: &SkyPosition,
) -> Option<TileMatch<'a>> {
    tiles
        .map(|tile| TileMatch {
            tile,
            separation_deg: position.separation_deg(&tile.center),
        })
        .min_by(|a, b| {
            a.separation_deg
                .total_cmp(&b.separation_deg)
                .then_with(|| a.tile.name.cmp(&b.tile.name))
        })
}

async fn fetch_listing(client: &reqwest::Client, url: &str, config: &Config) -> Result<String> {
    let response = client
        .get(url)
        .timeout(config.http.request_timeout)
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.text().await?)
}
