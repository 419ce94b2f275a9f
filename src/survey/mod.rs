//! Per-survey request construction and response validation
//!
//! Every archive is wrapped by one [`SurveyAdapter`] implementation. The
//! adapter decides how the position is encoded, which URL and parameters are
//! sent, what the artifact is called on disk, whether a payload is a usable
//! image, and how transient failures are retried. The HTTP exchange itself is
//! shared and lives in [`crate::executor`].

use crate::config::RetryConfig;
use crate::coords::{CoordinateEncoding, CoordinateFormatter};
use crate::error::{Error, Result};
use crate::fits;
use crate::types::{CutoutRequest, Survey};
use std::time::Duration;

mod first;
mod lotss;
mod nvss;
mod tile_index;
mod vlass;

pub use first::FirstAdapter;
pub use lotss::LotssAdapter;
pub use nvss::NvssAdapter;
pub use tile_index::{Tile, TileIndex, TileMatch, decode_tile_center};
pub use vlass::VlassAdapter;

/// How the archive delivers the artifact
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The response to the request is the artifact
    Synchronous,
    /// The archive answers `202 Accepted` until the artifact is ready
    PollUntilReady {
        /// Wait between polls when no `Retry-After` header is sent
        interval: Duration,
        /// Polls allowed before the attempt counts as timed out
        max_polls: u32,
    },
}

/// Static description of one archive endpoint
#[derive(Clone, Debug, PartialEq)]
pub struct SurveyEndpoint {
    /// Base URL of the cutout service or tile directory
    pub base_url: String,
    /// HTTP method used for the exchange
    pub method: reqwest::Method,
    /// How positions are encoded in the request
    pub encoding: CoordinateEncoding,
    /// Content type the archive declares for a good artifact
    pub content_type: &'static str,
    /// Synchronous or polled delivery
    pub delivery: Delivery,
    /// Expected upper bound on artifact size, used for logging only
    pub max_size_hint: u64,
}

/// Fully resolved HTTP exchange handed to the executor
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequestSpec {
    /// HTTP method
    pub method: reqwest::Method,
    /// Absolute URL without query string
    pub url: String,
    /// Query parameters, in the order the archive documents them
    pub query: Vec<(String, String)>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Timeout for one complete exchange, body included
    pub timeout: Duration,
    /// Polling behaviour
    pub delivery: Delivery,
}

/// What the executor observed about a downloaded body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseSample {
    /// Leading bytes (at most [`fits::SNIFF_LEN`])
    pub head: Vec<u8>,
    /// Total body length in bytes
    pub len: u64,
    /// Declared `Content-Type`, if any
    pub content_type: Option<String>,
}

/// A payload that passed validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedArtifact {
    /// Total length in bytes
    pub len: u64,
    /// Declared `Content-Type`, if any
    pub content_type: Option<String>,
}

/// Capability interface shared by every survey
///
/// Implementations are chosen once per query and never change afterwards.
pub trait SurveyAdapter: Send + Sync + std::fmt::Debug {
    /// The survey this adapter serves
    fn survey(&self) -> Survey;

    /// Static endpoint description
    fn endpoint(&self) -> &SurveyEndpoint;

    /// Formatter for the endpoint's coordinate encoding
    fn formatter(&self) -> CoordinateFormatter {
        CoordinateFormatter::new(self.endpoint().encoding)
    }

    /// Deterministic file name for the artifact of `request`
    fn file_name(&self, request: &CutoutRequest) -> Result<String>;

    /// Encode `request` as an HTTP exchange
    fn build_request(&self, request: &CutoutRequest) -> Result<HttpRequestSpec>;

    /// Decide whether a downloaded body is a usable image
    fn validate_response(&self, sample: &ResponseSample) -> Result<ValidatedArtifact> {
        validate_fits_payload(self.survey(), self.endpoint(), sample)
    }

    /// Retry policy for transient failures
    fn retry_policy(&self) -> &RetryConfig;
}

/// Validation shared by all FITS-serving archives
///
/// Rejects HTML error pages, payloads shorter than one FITS block and bodies
/// without a `SIMPLE = T` primary header.
pub fn validate_fits_payload(
    survey: Survey,
    endpoint: &SurveyEndpoint,
    sample: &ResponseSample,
) -> Result<ValidatedArtifact> {
    if fits::looks_like_html(&sample.head, sample.content_type.as_deref()) {
        return Err(Error::invalid_response(format!(
            "{survey} archive returned an HTML page instead of a FITS image"
        )));
    }
    fits::check_length(sample.len)?;
    fits::check_primary_header(&sample.head)?;

    if sample.len > endpoint.max_size_hint {
        tracing::warn!(
            survey = %survey,
            bytes = sample.len,
            hint = endpoint.max_size_hint,
            "artifact larger than expected"
        );
    }
    if let Some(ct) = sample.content_type.as_deref()
        && !ct.starts_with(endpoint.content_type)
    {
        tracing::debug!(
            survey = %survey,
            content_type = ct,
            expected = endpoint.content_type,
            "unexpected content type on a valid FITS payload"
        );
    }

    Ok(ValidatedArtifact {
        len: sample.len,
        content_type: sample.content_type.clone(),
    })
}

/// Render a size in arcminutes for file names, without trailing zeros
pub(crate) fn size_label(size_arcmin: f64) -> String {
    // shortest text that reads back as the same f64, so distinct sizes never share a name
    format!("{size_arcmin}arcmin")
}

/// File name shared by the on-demand cutout services
pub(crate) fn cutout_file_name(survey: Survey, request: &CutoutRequest, size: f64) -> Result<String> {
    let designation = CoordinateFormatter::designation(&request.position)?;
    Ok(format!(
        "{}_{}_{}.fits",
        survey.dir_name(),
        designation,
        size_label(size)
    ))
}

/// Build query pairs from string slices
pub(crate) fn pairs<const N: usize>(items: [(&str, String); N]) -> Vec<(String, String)> {
    items
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fits::tests::sample_fits;
    use crate::types::SkyPosition;
    use std::path::PathBuf;

    pub(crate) fn request(survey: Survey, size_arcmin: f64) -> CutoutRequest {
        CutoutRequest {
            survey,
            position: SkyPosition::from_sexagesimal("10h50m07.270s", "+30d40m37.52s").unwrap(),
            size_arcmin,
            destination_dir: PathBuf::from("/tmp/rquery"),
            overwrite: false,
        }
    }

    fn endpoint() -> SurveyEndpoint {
        SurveyEndpoint {
            base_url: "https://archive.example/cutout".to_string(),
            method: reqwest::Method::GET,
            encoding: CoordinateEncoding::Decimal,
            content_type: "image/fits",
            delivery: Delivery::Synchronous,
            max_size_hint: 10 * 1024 * 1024,
        }
    }

    fn sample(bytes: &[u8], content_type: Option<&str>) -> ResponseSample {
        ResponseSample {
            head: bytes[..bytes.len().min(fits::SNIFF_LEN)].to_vec(),
            len: bytes.len() as u64,
            content_type: content_type.map(str::to_string),
        }
    }

    #[test]
    fn size_labels_are_exact() {
        assert_eq!(size_label(5.0), "5arcmin");
        assert_eq!(size_label(2.5), "2.5arcmin");
        assert_eq!(size_label(0.25), "0.25arcmin");
        assert_eq!(size_label(10.0), "10arcmin");
        assert_eq!(size_label(1.004), "1.004arcmin");
        assert_eq!(size_label(0.001), "0.001arcmin");
        assert_ne!(size_label(0.001), size_label(0.004));
    }

    #[test]
    fn fits_payload_accepted() {
        let bytes = sample_fits(2);
        let artifact =
            validate_fits_payload(Survey::Lotss, &endpoint(), &sample(&bytes, Some("image/fits")))
                .unwrap();
        assert_eq!(artifact.len, bytes.len() as u64);
    }

    #[test]
    fn html_page_rejected_even_with_http_200_body() {
        let page = b"<html><body>Error: coordinates outside survey area</body></html>";
        let err = validate_fits_payload(Survey::First, &endpoint(), &sample(page, None)).unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidResponse);
        assert!(err.to_string().contains("HTML"));
    }

    #[test]
    fn tiny_fits_like_payload_rejected() {
        let mut bytes = sample_fits(0);
        bytes.truncate(1000);
        let err = validate_fits_payload(Survey::Nvss, &endpoint(), &sample(&bytes, None)).unwrap_err();
        assert!(err.to_string().contains("smaller than one FITS block"));
    }

    #[test]
    fn binary_without_signature_rejected() {
        let bytes = vec![0u8; 4 * fits::FITS_BLOCK_LEN];
        let err = validate_fits_payload(Survey::Vlass, &endpoint(), &sample(&bytes, None)).unwrap_err();
        assert!(err.to_string().contains("missing FITS signature"));
    }

    #[test]
    fn cutout_names_are_deterministic() {
        let name = cutout_file_name(Survey::First, &request(Survey::First, 5.0), 5.0).unwrap();
        assert_eq!(name, "FIRST_J105007.27+304037.52_5arcmin.fits");
    }
}
