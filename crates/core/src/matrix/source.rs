use crate::config::Settings;
use crate::error::AllocationError;
use crate::matrix::{
    parse_age_adjustments, parse_rules_section, parse_weights, AgeAdjustmentTable,
    AllocationMatrix, BaseAllocationTable, GoalTuningTable, SubAllocationWeights,
    BASE_ALLOCATION_SECTION, GOAL_TUNING_SECTION, RULES_DOCUMENT, WEIGHTS_DOCUMENT,
};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRIES: u32 = 3;
const MAX_BACKOFF_SHIFT: u32 = 5;

/// Backing store of the rule tables. Implementors only fetch raw documents;
/// parsing and validation are shared.
#[async_trait::async_trait]
pub trait MatrixSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_document(&self, name: &str) -> Result<String, AllocationError>;

    async fn load_base_allocation(&self) -> Result<BaseAllocationTable, AllocationError> {
        let doc = self.fetch_document(RULES_DOCUMENT).await?;
        parse_rules_section(&doc, BASE_ALLOCATION_SECTION)
    }

    async fn load_age_adjustments(&self) -> Result<AgeAdjustmentTable, AllocationError> {
        let doc = self.fetch_document(RULES_DOCUMENT).await?;
        parse_age_adjustments(&doc)
    }

    async fn load_goal_tuning(&self) -> Result<GoalTuningTable, AllocationError> {
        let doc = self.fetch_document(RULES_DOCUMENT).await?;
        parse_rules_section(&doc, GOAL_TUNING_SECTION)
    }

    async fn load_sub_allocation_weights(&self) -> Result<SubAllocationWeights, AllocationError> {
        let doc = self.fetch_document(WEIGHTS_DOCUMENT).await?;
        parse_weights(&doc)
    }

    async fn load_matrix(&self) -> Result<AllocationMatrix, AllocationError> {
        let rules = self.fetch_document(RULES_DOCUMENT).await?;
        let weights = self.fetch_document(WEIGHTS_DOCUMENT).await?;
        let matrix = AllocationMatrix::from_documents(&rules, &weights)?;

        tracing::info!(
            source = self.source_name(),
            base_rows = matrix.base_allocation.len(),
            age_rows = matrix.age_adjustments.len(),
            goal_rows = matrix.goal_tuning.len(),
            weighted_classes = matrix.sub_allocation_weights.len(),
            "allocation matrix loaded"
        );
        Ok(matrix)
    }
}

/// Picks the HTTP source when `MATRIX_BASE_URL` is set, the directory source otherwise.
pub fn from_settings(settings: &Settings) -> anyhow::Result<Box<dyn MatrixSource>> {
    if settings.matrix_base_url.is_some() {
        return Ok(Box::new(HttpMatrixSource::from_settings(settings)?));
    }
    Ok(Box::new(FileMatrixSource::new(settings.matrix_dir())))
}

#[derive(Debug, Clone)]
pub struct FileMatrixSource {
    dir: PathBuf,
}

impl FileMatrixSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl MatrixSource for FileMatrixSource {
    fn source_name(&self) -> &'static str {
        "file"
    }

    async fn fetch_document(&self, name: &str) -> Result<String, AllocationError> {
        let path = self.dir.join(name);
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            AllocationError::DataUnavailable(format!("failed to read {}: {e}", path.display()))
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpMatrixSource {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retries: u32,
}

impl HttpMatrixSource {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_matrix_base_url()?.to_string();

        let timeout_secs = std::env::var("MATRIX_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("MATRIX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        Self::new(
            base_url,
            settings.matrix_api_key.clone(),
            retries,
            Duration::from_secs(timeout_secs),
        )
    }

    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        retries: u32,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build matrix http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
            retries: retries.max(1),
        })
    }

    fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }

    fn headers(&self) -> Result<HeaderMap, AllocationError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(api_key).map_err(|e| {
                AllocationError::DataUnavailable(format!("invalid MATRIX_API_KEY header: {e}"))
            })?;
            headers.insert("x-api-key", value);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, name: &str) -> Result<String, AllocationError> {
        let url = self.url(name);
        let res = self
            .http
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| AllocationError::DataUnavailable(format!("GET {url} failed: {e}")))?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            AllocationError::DataUnavailable(format!("failed to read {url} response: {e}"))
        })?;

        if !status.is_success() {
            return Err(AllocationError::DataUnavailable(format!(
                "matrix source HTTP {status} for {url}"
            )));
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl MatrixSource for HttpMatrixSource {
    fn source_name(&self) -> &'static str {
        "http"
    }

    async fn fetch_document(&self, name: &str) -> Result<String, AllocationError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(name).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = backoff_for(attempt);
                    tracing::warn!(attempt, ?backoff, document = name, error = %err, "matrix fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// 1s, 2s, 4s, ... capped at 32s.
fn backoff_for(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT))
}
