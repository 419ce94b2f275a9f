//! Caller-facing cutout query
//!
//! A [`CutoutQuery`] pins one survey, position and size. Construction
//! validates the arguments, so a query that exists can always be attempted.
//! [`CutoutQuery::download_image`] reports every expected failure through the
//! returned [`CutoutResult`] instead of an `Err`.

use crate::config::Config;
use crate::error::{Error, ErrorDetail, Result};
use crate::executor::{DownloadExecutor, DownloadOutcome};
use crate::survey::{
    FirstAdapter, HttpRequestSpec, LotssAdapter, NvssAdapter, SurveyAdapter, TileIndex,
    VlassAdapter,
};
use crate::types::{CutoutRequest, CutoutResult, SkyPosition, Survey};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Default cutout size in arcminutes
pub const DEFAULT_SIZE_ARCMIN: f64 = 5.0;

/// A cutout request bound to its configuration
#[derive(Clone, Debug)]
pub struct CutoutQuery {
    request: CutoutRequest,
    config: Config,
    executor: DownloadExecutor,
    /// Fixed for the query's lifetime; VLASS fills it on first use
    adapter: Arc<OnceCell<Arc<dyn SurveyAdapter>>>,
}

/// Everything needed to run the exchange, resolved before any I/O on the artifact
struct Plan {
    adapter: Arc<dyn SurveyAdapter>,
    path: PathBuf,
    spec: HttpRequestSpec,
}

impl CutoutQuery {
    /// Query with the default configuration
    ///
    /// # Errors
    ///
    /// See [`CutoutQuery::with_config`].
    pub fn new(survey: Survey, position: SkyPosition, size_arcmin: f64) -> Result<Self> {
        Self::with_config(survey, position, size_arcmin, Config::default())
    }

    /// Query with an explicit configuration
    ///
    /// The artifact goes to `<output_root>/<SURVEY>/` unless
    /// [`CutoutQuery::destination`] overrides it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] for an out-of-range position,
    /// [`Error::InvalidArgument`] for a size that is not a positive finite
    /// number, and [`Error::Config`] for an invalid configuration.
    pub fn with_config(
        survey: Survey,
        position: SkyPosition,
        size_arcmin: f64,
        config: Config,
    ) -> Result<Self> {
        position.check_range()?;
        if !size_arcmin.is_finite() || size_arcmin <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "cutout size must be a positive number of arcminutes, got {size_arcmin}"
            )));
        }
        config.validate()?;
        let executor = DownloadExecutor::new(&config.http)?;
        let adapter: Option<Arc<dyn SurveyAdapter>> = match survey {
            Survey::First => Some(Arc::new(FirstAdapter::new(&config))),
            Survey::Nvss => Some(Arc::new(NvssAdapter::new(&config))),
            Survey::Lotss => Some(Arc::new(LotssAdapter::new(&config))),
            // needs the tile index, which is loaded on first use
            Survey::Vlass => None,
        };

        Ok(Self {
            request: CutoutRequest {
                survey,
                position,
                size_arcmin,
                destination_dir: config.output_root.join(survey.dir_name()),
                overwrite: false,
            },
            config,
            executor,
            adapter: Arc::new(OnceCell::new_with(adapter)),
        })
    }

    /// Write the artifact into `dir` instead of the survey directory
    pub fn destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.request.destination_dir = dir.into();
        self
    }

    /// Re-fetch even when the artifact already exists
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.request.overwrite = overwrite;
        self
    }

    /// Reuse an executor (and its connection pool) across queries
    pub fn executor(mut self, executor: DownloadExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// The request this query will run
    pub fn request(&self) -> &CutoutRequest {
        &self.request
    }

    /// The configuration in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch the cutout, reporting failures in the result
    ///
    /// On success `path` is the absolute artifact path. On failure it is the
    /// path the artifact would have had, or the destination directory when
    /// the failure happened before a file name could be chosen.
    pub async fn download_image(&self) -> CutoutResult {
        let survey = self.request.survey;
        let plan = match self.plan().await {
            Ok(plan) => plan,
            Err(e) => return self.failure(absolute(&self.request.destination_dir), &e),
        };

        match self
            .executor
            .execute(plan.adapter.as_ref(), &plan.spec, &plan.path, self.request.overwrite)
            .await
        {
            Ok(outcome) => CutoutResult {
                path: outcome.path,
                success: true,
                fetched: outcome.fetched,
                error: None,
            },
            Err(e) => {
                tracing::debug!(survey = %survey, url = %plan.spec.url, "download failed");
                self.failure(plan.path, &e)
            }
        }
    }

    /// Fetch the cutout, propagating the error
    ///
    /// # Errors
    ///
    /// Returns the underlying [`Error`] for any failure.
    pub async fn try_download_image(&self) -> Result<DownloadOutcome> {
        let plan = self.plan().await?;
        self.executor
            .execute(plan.adapter.as_ref(), &plan.spec, &plan.path, self.request.overwrite)
            .await
    }

    /// Final artifact path, resolving the VLASS tile if needed
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCoverage`] for VLASS positions outside every tile.
    pub async fn artifact_path(&self) -> Result<PathBuf> {
        Ok(self.plan().await?.path)
    }

    async fn plan(&self) -> Result<Plan> {
        let adapter = self.adapter().await?;
        let name = adapter.file_name(&self.request)?;
        let path = absolute(&self.request.destination_dir.join(name));
        let spec = adapter.build_request(&self.request)?;
        Ok(Plan {
            adapter,
            path,
            spec,
        })
    }

    async fn adapter(&self) -> Result<Arc<dyn SurveyAdapter>> {
        let adapter = self
            .adapter
            .get_or_try_init(|| async {
                let index = TileIndex::shared(&self.config, self.executor.client()).await?;
                let adapter: Arc<dyn SurveyAdapter> = Arc::new(VlassAdapter::new(&self.config, index));
                Ok::<_, Error>(adapter)
            })
            .await?;
        Ok(Arc::clone(adapter))
    }

    fn failure(&self, path: PathBuf, error: &Error) -> CutoutResult {
        let detail = ErrorDetail::from(error);
        tracing::warn!(
            survey = %self.request.survey,
            ra_deg = self.request.position.ra_deg(),
            dec_deg = self.request.position.dec_deg(),
            kind = %detail.kind,
            error = %error,
            "cutout not retrieved"
        );
        CutoutResult {
            path,
            success: false,
            fetched: false,
            error: Some(detail),
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
