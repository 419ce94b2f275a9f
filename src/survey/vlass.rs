//! VLASS quicklook median-stack tiles
//!
//! VLASS has no cutout service. A request resolves to the tile whose centre
//! is nearest the target and the whole tile is downloaded under its own name,
//! so every target inside one tile shares a single file.

use super::{
    Delivery, HttpRequestSpec, SurveyAdapter, SurveyEndpoint, TileIndex, TileMatch,
};
use crate::config::{Config, RetryConfig};
use crate::coords::{CoordinateEncoding, SexagesimalStyle};
use crate::error::{Error, Result};
use crate::types::{CutoutRequest, Survey};
use std::sync::Arc;
use std::time::Duration;

/// Adapter that maps a position onto a quicklook tile
#[derive(Clone, Debug)]
pub struct VlassAdapter {
    endpoint: SurveyEndpoint,
    retry: RetryConfig,
    timeout: Duration,
    index: Arc<TileIndex>,
    max_separation_deg: f64,
}

impl VlassAdapter {
    /// Build from configuration and a loaded tile index
    pub fn new(config: &Config, index: Arc<TileIndex>) -> Self {
        let mut base_url = config.endpoints.vlass_tile_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            endpoint: SurveyEndpoint {
                base_url,
                method: reqwest::Method::GET,
                encoding: CoordinateEncoding::Sexagesimal(SexagesimalStyle::Compact),
                content_type: "application/fits",
                delivery: Delivery::Synchronous,
                max_size_hint: 256 * 1024 * 1024,
            },
            retry: config.retry.clone(),
            timeout: config.http.tile_timeout,
            index,
            max_separation_deg: config.vlass.max_separation_deg,
        }
    }

    /// Resolve the tile covering the request position
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCoverage`] if no tile centre is within the cutoff.
    pub fn resolve(&self, request: &CutoutRequest) -> Result<TileMatch<'_>> {
        request.position.check_range()?;
        let found = self.index.nearest(&request.position, self.max_separation_deg)?;
        tracing::info!(
            tile = %found.tile.name,
            separation_deg = found.separation_deg,
            "resolved VLASS tile"
        );
        Ok(found)
    }
}

impl SurveyAdapter for VlassAdapter {
    fn survey(&self) -> Survey {
        Survey::Vlass
    }

    fn endpoint(&self) -> &SurveyEndpoint {
        &self.endpoint
    }

    fn file_name(&self, request: &CutoutRequest) -> Result<String> {
        request.position.check_range()?;
        let found = self.index.nearest(&request.position, self.max_separation_deg)?;
        Ok(found.tile.name.clone())
    }

    fn build_request(&self, request: &CutoutRequest) -> Result<HttpRequestSpec> {
        let found = self.resolve(request)?;
        let base = url::Url::parse(&self.endpoint.base_url)
            .map_err(|e| Error::config(e.to_string(), "endpoints.vlass_tile_url"))?;
        let url = base
            .join(&found.tile.name)
            .map_err(|e| Error::config(e.to_string(), "endpoints.vlass_tile_url"))?;

        Ok(HttpRequestSpec {
            method: self.endpoint.method.clone(),
            url: url.to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            timeout: self.timeout,
            delivery: self.endpoint.delivery,
        })
    }

    fn retry_policy(&self) -> &RetryConfig {
        &self.retry
    }
}
