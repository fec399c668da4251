//! HTTP client for the skills extraction API
//!
//! POSTs product text to the configured extraction endpoint and maps the
//! response into [`ExtractedSkill`] values. The endpoint URL and access token
//! come from the settings table (`skills_api_url`, `skills_api_token`);
//! refresh runs fail with a configuration error until the host sets them.

use super::{ExtractedSkill, SkillExtractor};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use taxonomy_common::db::settings::get_setting;
use taxonomy_common::{Error, Result};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Default timeout for extraction API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Rate limit: 1 request per second, per the extraction API's terms
const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(1000);

/// Skills below this confidence are discarded
const MIN_EXTRACTION_CONFIDENCE: f64 = 0.4;

/// Skills extraction API client
///
/// Rate-limits itself to one request per second and applies a request
/// timeout. One instance is shared across a refresh run.
pub struct HttpSkillsClient {
    http_client: Client,
    base_url: String,
    /// Rate limiter (last request time)
    rate_limiter: Arc<Mutex<Option<Instant>>>,
}

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    text: &'a str,
    confidence_threshold: f64,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    data: Vec<ExtractedSkillEntry>,
}

#[derive(Debug, Deserialize)]
struct ExtractedSkillEntry {
    skill: SkillEntry,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct SkillEntry {
    id: String,
    name: String,
    #[serde(rename = "infoUrl")]
    info_url: Option<String>,
    #[serde(rename = "typeId")]
    type_id: Option<String>,
    #[serde(default)]
    description: String,
    category: Option<CategoryEntry>,
    subcategory: Option<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    name: String,
}

impl HttpSkillsClient {
    /// Create a client for the given endpoint and access token
    pub fn new(base_url: &str, api_token: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", api_token))
            .map_err(|_| Error::Config("skills_api_token contains invalid characters".to_string()))?;
        headers.insert(header::AUTHORIZATION, auth_value);

        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(Mutex::new(None)),
        })
    }

    /// Create a client from the settings table
    ///
    /// Fails with a configuration error when `skills_api_url` or
    /// `skills_api_token` is unset.
    pub async fn from_settings(pool: &SqlitePool) -> Result<Self> {
        let base_url: String = get_setting(pool, "skills_api_url")
            .await?
            .ok_or_else(|| Error::Config("skills_api_url is not configured".to_string()))?;
        let api_token: String = get_setting(pool, "skills_api_token")
            .await?
            .ok_or_else(|| Error::Config("skills_api_token is not configured".to_string()))?;

        Self::new(&base_url, &api_token)
    }

    /// Enforce rate limit (1 request/second)
    async fn enforce_rate_limit(&self) {
        let mut last_request = self.rate_limiter.lock().await;

        if let Some(last_time) = *last_request {
            let elapsed = last_time.elapsed();
            if elapsed < RATE_LIMIT_INTERVAL {
                let sleep_duration = RATE_LIMIT_INTERVAL - elapsed;
                debug!(
                    sleep_ms = sleep_duration.as_millis(),
                    "Rate limiting: sleeping before extraction request"
                );
                sleep(sleep_duration).await;
            }
        }

        *last_request = Some(Instant::now());
    }

    fn parse_response(response: ExtractResponse) -> Vec<ExtractedSkill> {
        response
            .data
            .into_iter()
            .filter(|entry| entry.confidence >= MIN_EXTRACTION_CONFIDENCE)
            .map(|entry| ExtractedSkill {
                external_id: entry.skill.id,
                name: entry.skill.name,
                info_url: entry.skill.info_url,
                type_id: entry.skill.type_id,
                description: entry.skill.description,
                category: entry.skill.category.map(|c| c.name),
                subcategory: entry.skill.subcategory.map(|c| c.name),
                confidence: entry.confidence,
            })
            .collect()
    }
}

#[async_trait]
impl SkillExtractor for HttpSkillsClient {
    async fn extract_skills(&self, text: &str) -> Result<Vec<ExtractedSkill>> {
        self.enforce_rate_limit().await;

        let url = format!("{}/extract", self.base_url);
        let request = ExtractRequest {
            text,
            confidence_threshold: MIN_EXTRACTION_CONFIDENCE,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::External(format!("Extraction API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::External(format!(
                "Extraction API returned HTTP {}",
                response.status()
            )));
        }

        let parsed: ExtractResponse = response
            .json()
            .await
            .map_err(|e| Error::External(format!("Invalid extraction API response: {}", e)))?;

        Ok(Self::parse_response(parsed))
    }
}
