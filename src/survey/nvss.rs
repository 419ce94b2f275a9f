//! NVSS postage-stamp server

use super::{
    Delivery, HttpRequestSpec, SurveyAdapter, SurveyEndpoint, cutout_file_name, pairs,
};
use crate::config::{Config, RetryConfig};
use crate::coords::{CoordinateEncoding, SexagesimalStyle};
use crate::error::Result;
use crate::types::{CutoutRequest, Survey};
use std::time::Duration;

/// NVSS pixel size in arcseconds
const CELL_ARCSEC: &str = "2.0";

/// Adapter for the NVSS postage-stamp CGI
#[derive(Clone, Debug)]
pub struct NvssAdapter {
    endpoint: SurveyEndpoint,
    retry: RetryConfig,
    timeout: Duration,
}

impl NvssAdapter {
    /// Build from the configured endpoint and retry policy
    pub fn new(config: &Config) -> Self {
        Self {
            endpoint: SurveyEndpoint {
                base_url: config.endpoints.nvss_url.clone(),
                method: reqwest::Method::GET,
                encoding: CoordinateEncoding::Sexagesimal(SexagesimalStyle::Spaced),
                content_type: "image/x-fits",
                delivery: Delivery::Synchronous,
                max_size_hint: 4 * 1024 * 1024,
            },
            retry: config.retry.clone(),
            timeout: config.http.request_timeout,
        }
    }
}

impl SurveyAdapter for NvssAdapter {
    fn survey(&self) -> Survey {
        Survey::Nvss
    }

    fn endpoint(&self) -> &SurveyEndpoint {
        &self.endpoint
    }

    fn file_name(&self, request: &CutoutRequest) -> Result<String> {
        cutout_file_name(Survey::Nvss, request, request.size_arcmin)
    }

    fn build_request(&self, request: &CutoutRequest) -> Result<HttpRequestSpec> {
        let position = self.formatter().format(&request.position)?;
        // The server takes the field size in degrees along each axis
        let size_deg = format!("{:.6}", request.size_arcmin / 60.0);

        Ok(HttpRequestSpec {
            method: self.endpoint.method.clone(),
            url: self.endpoint.base_url.clone(),
            query: pairs([
                ("Equinox", "J2000".to_string()),
                ("PolType", "I".to_string()),
                ("ObjName", String::new()),
                ("RA", position.ra),
                ("Dec", position.dec),
                ("Size", format!("{size_deg} {size_deg}")),
                ("Cells", format!("{CELL_ARCSEC} {CELL_ARCSEC}")),
                ("Type", self.endpoint.content_type.to_string()),
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
