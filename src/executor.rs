//! HTTP download with validation and atomic publication
//!
//! The executor performs the exchange described by an [`HttpRequestSpec`],
//! streams the body into a hidden temporary file next to the destination,
//! lets the adapter validate it, and only then renames it into place. A file
//! at the destination path is therefore always a complete, validated artifact.

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::fits::SNIFF_LEN;
use crate::retry::{IsRetryable, with_retry};
use crate::survey::{Delivery, HttpRequestSpec, ResponseSample, SurveyAdapter};
use rand::Rng;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// What [`DownloadExecutor::execute`] did
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Final artifact path
    pub path: PathBuf,
    /// Artifact size in bytes
    pub bytes: u64,
    /// False when an existing file was reused
    pub fetched: bool,
    /// HTTP attempts made (0 on a cache hit)
    pub attempts: u32,
}

/// Shared HTTP client plus the download discipline
#[derive(Clone, Debug)]
pub struct DownloadExecutor {
    client: reqwest::Client,
}

impl DownloadExecutor {
    /// Build an executor with a client configured from `http`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be created.
    pub fn new(http: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(http.connect_timeout)
            .user_agent(http.user_agent.as_str())
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {e}"), "http"))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Download `spec` to `destination`
    ///
    /// With `overwrite == false` an existing file at `destination` that
    /// passes the adapter's validation is returned without any network
    /// traffic. A file that fails it is fetched again. Otherwise the exchange is
    /// retried according to the adapter's policy. On failure no file is left
    /// at `destination` by this call and the temporary file is removed.
    pub async fn execute(
        &self,
        adapter: &dyn SurveyAdapter,
        spec: &HttpRequestSpec,
        destination: &Path,
        overwrite: bool,
    ) -> Result<DownloadOutcome> {
        if !overwrite && let Some(sample) = existing_artifact(destination).await? {
            match adapter.validate_response(&sample) {
                Ok(artifact) => {
                    tracing::debug!(
                        survey = %adapter.survey(),
                        path = %destination.display(),
                        bytes = artifact.len,
                        "using cached artifact"
                    );
                    return Ok(DownloadOutcome {
                        path: destination.to_path_buf(),
                        bytes: artifact.len,
                        fetched: false,
                        attempts: 0,
                    });
                }
                Err(e) => tracing::warn!(
                    survey = %adapter.survey(),
                    path = %destination.display(),
                    error = %e,
                    "cached artifact failed validation, fetching again"
                ),
            }
        }

        let dir = destination
            .parent()
            .ok_or_else(|| Error::InvalidArgument(format!("{} has no parent", destination.display())))?;
        tokio::fs::create_dir_all(dir).await?;

        tracing::info!(survey = %adapter.survey(), url = %spec.url, "fetching artifact");
        let mut attempts = 0u32;
        let bytes = with_retry(adapter.retry_policy(), || {
            attempts += 1;
            self.attempt(adapter, spec, destination)
        })
        .await?;

        tracing::info!(
            survey = %adapter.survey(),
            path = %destination.display(),
            bytes,
            attempts,
            "artifact downloaded"
        );
        Ok(DownloadOutcome {
            path: destination.to_path_buf(),
            bytes,
            fetched: true,
            attempts,
        })
    }

    /// One exchange: send, stream to a temp file, validate, publish
    async fn attempt(
        &self,
        adapter: &dyn SurveyAdapter,
        spec: &HttpRequestSpec,
        destination: &Path,
    ) -> Result<u64> {
        let response = self.send(spec).await?;
        let temp = temp_path_for(destination);

        let result = publish(adapter, response, &temp, destination).await;
        if let Err(e) = &result
            && !e.is_retryable()
        {
            tracing::warn!(survey = %adapter.survey(), url = %spec.url, error = %e, "payload rejected");
        }
        if result.is_err()
            && let Err(e) = tokio::fs::remove_file(&temp).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %temp.display(), error = %e, "failed to remove temporary file");
        }
        result
    }

    /// Send the request, polling while the archive reports the artifact is not ready
    async fn send(&self, spec: &HttpRequestSpec) -> Result<reqwest::Response> {
        let mut polls = 0u32;
        loop {
            let mut builder = self
                .client
                .request(spec.method.clone(), spec.url.as_str())
                .timeout(spec.timeout);
            if !spec.query.is_empty() {
                builder = builder.query(&spec.query);
            }
            for (name, value) in &spec.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            tracing::debug!(url = %spec.url, method = %spec.method, "sending request");
            let response = builder.send().await?;
            let status = response.status();

            if status == StatusCode::ACCEPTED
                && let Delivery::PollUntilReady {
                    interval,
                    max_polls,
                } = spec.delivery
            {
                polls += 1;
                if polls > max_polls {
                    return Err(Error::Timeout(format!(
                        "{} not ready after {max_polls} polls",
                        spec.url
                    )));
                }
                let wait = retry_after(&response).map_or(interval, |d| d.min(max_poll_wait(interval)));
                tracing::debug!(url = %spec.url, polls, wait_ms = wait.as_millis(), "artifact not ready");
                tokio::time::sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                return Err(Error::HttpStatus {
                    status: status.as_u16(),
                    url: spec.url.clone(),
                });
            }
            return Ok(response);
        }
    }
}

/// Stream into `temp`, validate, then rename onto `destination`
async fn publish(
    adapter: &dyn SurveyAdapter,
    response: reqwest::Response,
    temp: &Path,
    destination: &Path,
) -> Result<u64> {
    let sample = stream_to_file(response, temp).await?;
    let artifact = adapter.validate_response(&sample)?;
    tokio::fs::rename(temp, destination).await?;
    Ok(artifact.len)
}

/// Longest single wait a `Retry-After` header may impose, as a multiple of the poll interval
const MAX_POLL_WAIT_FACTOR: u32 = 10;

fn max_poll_wait(interval: Duration) -> Duration {
    interval.saturating_mul(MAX_POLL_WAIT_FACTOR)
}

/// Leading bytes and length of a regular file already at `path`
async fn existing_artifact(path: &Path) -> Result<Option<ResponseSample>> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut head = Vec::with_capacity(SNIFF_LEN);
    let file = tokio::fs::File::open(path).await?;
    file.take(SNIFF_LEN as u64).read_to_end(&mut head).await?;

    Ok(Some(ResponseSample {
        head,
        len: meta.len(),
        content_type: None,
    }))
}

/// Hidden sibling of `destination`, unique per attempt
fn temp_path_for(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tag: u32 = rand::thread_rng().r#gen();
    destination.with_file_name(format!(".{name}.{tag:08x}.part"))
}

/// Delay requested by a `Retry-After: <seconds>` header
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    let value = response.headers().get(RETRY_AFTER)?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Stream the body to `path`, keeping the leading bytes for validation
async fn stream_to_file(mut response: reqwest::Response, path: &Path) -> Result<ResponseSample> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut file = tokio::fs::File::create(path).await?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    let mut len = 0u64;

    while let Some(chunk) = response.chunk().await? {
        if head.len() < SNIFF_LEN {
            let take = (SNIFF_LEN - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..take]);
        }
        file.write_all(&chunk).await?;
        len += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;

    Ok(ResponseSample {
        head,
        len,
        content_type,
    })
}
