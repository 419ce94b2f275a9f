//! LoTSS DR2 cutout service
//!
//! The service can take a while to assemble a cutout from the mosaics. While
//! it works it answers `202 Accepted`, so delivery is polled.

use super::{
    Delivery, HttpRequestSpec, SurveyAdapter, SurveyEndpoint, cutout_file_name, pairs,
};
use crate::config::{Config, RetryConfig};
use crate::coords::CoordinateEncoding;
use crate::error::Result;
use crate::types::{CutoutRequest, Survey};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: u32 = 30;

/// Adapter for the LoTSS DR2 cutout endpoint
#[derive(Clone, Debug)]
pub struct LotssAdapter {
    endpoint: SurveyEndpoint,
    retry: RetryConfig,
    timeout: Duration,
}

impl LotssAdapter {
    /// Build from the configured endpoint and retry policy
    pub fn new(config: &Config) -> Self {
        Self {
            endpoint: SurveyEndpoint {
                base_url: config.endpoints.lotss_url.clone(),
                method: reqwest::Method::GET,
                encoding: CoordinateEncoding::Decimal,
                content_type: "application/fits",
                delivery: Delivery::PollUntilReady {
                    interval: POLL_INTERVAL,
                    max_polls: MAX_POLLS,
                },
                max_size_hint: 16 * 1024 * 1024,
            },
            retry: config.retry.clone(),
            timeout: config.http.request_timeout,
        }
    }
}

impl SurveyAdapter for LotssAdapter {
    fn survey(&self) -> Survey {
        Survey::Lotss
    }

    fn endpoint(&self) -> &SurveyEndpoint {
        &self.endpoint
    }

    fn file_name(&self, request: &CutoutRequest) -> Result<String> {
        cutout_file_name(Survey::Lotss, request, request.size_arcmin)
    }

    fn build_request(&self, request: &CutoutRequest) -> Result<HttpRequestSpec> {
        let position = self.formatter().format(&request.position)?;

        Ok(HttpRequestSpec {
            method: self.endpoint.method.clone(),
            url: self.endpoint.base_url.clone(),
            query: pairs([
                ("pos", position.joined()),
                ("size", format!("{}", request.size_arcmin)),
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
