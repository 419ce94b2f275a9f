//! Core types for radioquery

use crate::error::{Error, ErrorDetail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Radio survey served by one of the cutout adapters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Survey {
    /// Faint Images of the Radio Sky at Twenty-cm (VLA, 1.4 GHz)
    First,
    /// VLA Sky Survey quicklook median-stack tiles (3 GHz)
    Vlass,
    /// LOFAR Two-metre Sky Survey, DR2 (144 MHz)
    Lotss,
    /// NRAO VLA Sky Survey (1.4 GHz)
    Nvss,
}

impl Survey {
    /// All supported surveys
    pub const ALL: [Survey; 4] = [Survey::First, Survey::Vlass, Survey::Lotss, Survey::Nvss];

    /// Directory name under the output root, also the file name prefix
    pub fn dir_name(&self) -> &'static str {
        match self {
            Survey::First => "FIRST",
            Survey::Vlass => "VLASS",
            Survey::Lotss => "LOTSS",
            Survey::Nvss => "NVSS",
        }
    }
}

impl std::fmt::Display for Survey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl std::str::FromStr for Survey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Survey::ALL
            .into_iter()
            .find(|survey| survey.dir_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown survey '{s}'")))
    }
}

/// ICRS sky position in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    ra_deg: f64,
    dec_deg: f64,
}

impl SkyPosition {
    /// Create a position, rejecting RA outside [0, 360) and Dec outside [-90, 90]
    pub fn new(ra_deg: f64, dec_deg: f64) -> Result<Self> {
        let position = Self { ra_deg, dec_deg };
        position.check_range()?;
        Ok(position)
    }

    /// Create a position without range checks
    ///
    /// Formatting such a position fails with [`Error::Format`].
    pub fn new_unchecked(ra_deg: f64, dec_deg: f64) -> Self {
        Self { ra_deg, dec_deg }
    }

    /// Parse sexagesimal RA (hours) and Dec (degrees)
    ///
    /// Accepts `10h50m07.270s`, `10 50 07.27` and `10:50:07.27` for RA, and the
    /// matching `+30d40m37.52s` style for Dec.
    pub fn from_sexagesimal(ra: &str, dec: &str) -> Result<Self> {
        let ra_hours = crate::coords::parse_sexagesimal(ra)?;
        let dec_deg = crate::coords::parse_sexagesimal(dec)?;
        Self::new(ra_hours * 15.0, dec_deg)
    }

    /// Right ascension in degrees
    pub fn ra_deg(&self) -> f64 {
        self.ra_deg
    }

    /// Declination in degrees
    pub fn dec_deg(&self) -> f64 {
        self.dec_deg
    }

    /// Great-circle separation to another position, in degrees
    pub fn separation_deg(&self, other: &SkyPosition) -> f64 {
        let (ra1, dec1) = (self.ra_deg.to_radians(), self.dec_deg.to_radians());
        let (ra2, dec2) = (other.ra_deg.to_radians(), other.dec_deg.to_radians());
        let half_ddec = (dec2 - dec1) / 2.0;
        let half_dra = (ra2 - ra1) / 2.0;
        let h = half_ddec.sin().powi(2) + dec1.cos() * dec2.cos() * half_dra.sin().powi(2);
        (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
    }

    pub(crate) fn check_range(&self) -> Result<()> {
        if !self.ra_deg.is_finite() || !(0.0..360.0).contains(&self.ra_deg) {
            return Err(Error::Format(format!(
                "right ascension {} deg outside [0, 360)",
                self.ra_deg
            )));
        }
        if !self.dec_deg.is_finite() || !(-90.0..=90.0).contains(&self.dec_deg) {
            return Err(Error::Format(format!(
                "declination {} deg outside [-90, 90]",
                self.dec_deg
            )));
        }
        Ok(())
    }
}

/// One cutout request, fixed for the lifetime of a `download_image` call
#[derive(Clone, Debug, PartialEq)]
pub struct CutoutRequest {
    /// Target survey
    pub survey: Survey,
    /// Target position
    pub position: SkyPosition,
    /// Requested angular size in arcminutes
    pub size_arcmin: f64,
    /// Directory the artifact is written into
    pub destination_dir: PathBuf,
    /// Re-fetch even if the destination file already exists
    pub overwrite: bool,
}

/// Outcome of a `download_image` call
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct CutoutResult {
    /// Absolute path of the artifact (where it would have been written on failure)
    pub path: PathBuf,
    /// True when a validated artifact exists at `path`
    pub success: bool,
    /// True when this call published a freshly downloaded artifact (false on cache hit or failure)
    pub fetched: bool,
    /// Failure category and message when `success` is false
    pub error: Option<ErrorDetail>,
}

impl CutoutResult {
    /// Split into the `(path, success)` pair
    pub fn into_tuple(self) -> (PathBuf, bool) {
        (self.path, self.success)
    }
}
