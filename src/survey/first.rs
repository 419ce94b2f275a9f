//! FIRST cutout server
//!
//! The CGI takes the whole position in the `RA` field as spaced sexagesimal
//! and an integer image size in arcminutes.

use super::{
    Delivery, HttpRequestSpec, SurveyAdapter, SurveyEndpoint, cutout_file_name, pairs,
};
use crate::config::{Config, RetryConfig};
use crate::coords::{CoordinateEncoding, SexagesimalStyle};
use crate::error::Result;
use crate::types::{CutoutRequest, Survey};
use std::time::Duration;

/// Largest cutout the server will produce, in arcminutes
const MAX_IMAGE_SIZE_ARCMIN: f64 = 60.0;

/// Adapter for the FIRST cutout CGI
#[derive(Clone, Debug)]
pub struct FirstAdapter {
    endpoint: SurveyEndpoint,
    retry: RetryConfig,
    timeout: Duration,
}

impl FirstAdapter {
    /// Build from the configured endpoint and retry policy
    pub fn new(config: &Config) -> Self {
        Self {
            endpoint: SurveyEndpoint {
                base_url: config.endpoints.first_url.clone(),
                method: reqwest::Method::GET,
                encoding: CoordinateEncoding::Sexagesimal(SexagesimalStyle::Spaced),
                content_type: "application/octet-stream",
                delivery: Delivery::Synchronous,
                max_size_hint: 8 * 1024 * 1024,
            },
            retry: config.retry.clone(),
            timeout: config.http.request_timeout,
        }
    }

    /// Size actually sent to the server: whole arcminutes, at least one
    fn image_size(size_arcmin: f64) -> f64 {
        size_arcmin.round().clamp(1.0, MAX_IMAGE_SIZE_ARCMIN)
    }
}

impl SurveyAdapter for FirstAdapter {
    fn survey(&self) -> Survey {
        Survey::First
    }

    fn endpoint(&self) -> &SurveyEndpoint {
        &self.endpoint
    }

    fn file_name(&self, request: &CutoutRequest) -> Result<String> {
        cutout_file_name(Survey::First, request, Self::image_size(request.size_arcmin))
    }

    fn build_request(&self, request: &CutoutRequest) -> Result<HttpRequestSpec> {
        let position = self.formatter().format(&request.position)?;
        let size = Self::image_size(request.size_arcmin);
        if size != request.size_arcmin {
            tracing::debug!(
                requested = request.size_arcmin,
                sent = size,
                "FIRST image size rounded to whole arcminutes"
            );
        }

        Ok(HttpRequestSpec {
            method: self.endpoint.method.clone(),
            url: self.endpoint.base_url.clone(),
            query: pairs([
                ("RA", position.joined()),
                ("Dec", String::new()),
                ("Equinox", "J2000".to_string()),
                ("ImageSize", format!("{size:.0}")),
                ("MaxInt", "10".to_string()),
                ("Epochs", String::new()),
                ("Fieldname", String::new()),
                ("ImageType", "FITS File".to_string()),
                (".cgifields", "ImageType".to_string()),
            ]),
            headers: Vec::new(),
            timeout: self.timeout,
            delivery: self.endpoint.delivery,
        })
    }

    fn retry_policy(&self) -> &RetryConfig {
        &self.retry
    }
}
