//! Remote snapshot fetch from the CMS query API.
//!
//! One blocking GET returns every curriculum document as a flat query
//! result, which the loader reads like any other snapshot. Failures here are
//! fatal: there is no retry and no partial graph.

use curriculum_model::DocumentType;
use std::fmt;
use std::time::Duration;

pub(crate) const SANITY_PROJECT_ID_ENV: &str = "SANITY_PROJECT_ID";
pub(crate) const SANITY_DATASET_ENV: &str = "SANITY_DATASET";
pub(crate) const SANITY_TOKEN_ENV: &str = "SANITY_TOKEN";
pub(crate) const SANITY_API_VERSION_ENV: &str = "SANITY_API_VERSION";
pub(crate) const CURRICULUM_FETCH_TIMEOUT_SECS_ENV: &str = "CURRICULUM_FETCH_TIMEOUT_SECS";

const DEFAULT_DATASET: &str = "production";
const DEFAULT_API_VERSION: &str = "v2021-10-21";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("missing {0} (remote fetch needs {SANITY_PROJECT_ID_ENV} and {SANITY_TOKEN_ENV})")]
    MissingConfig(&'static str),

    #[error("invalid {name}={value:?} ({reason})")]
    InvalidConfig {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("remote fetch is not available in this build (enable the `remote-fetch` feature)")]
    Disabled,

    #[error("failed to reach {url}: {message}")]
    Network { url: String, message: String },

    #[error("{url} answered HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {url}: {message}")]
    Payload { url: String, message: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub project_id: String,
    pub dataset: String,
    pub token: String,
    pub api_version: String,
    /// `None` disables the timeout.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("project_id", &self.project_id)
            .field("dataset", &self.dataset)
            .field("token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FetchConfig {
    pub fn from_env() -> Result<Self, FetchError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FetchError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let project_id =
            get(SANITY_PROJECT_ID_ENV).ok_or(FetchError::MissingConfig(SANITY_PROJECT_ID_ENV))?;
        if !project_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(FetchError::InvalidConfig {
                name: SANITY_PROJECT_ID_ENV,
                value: project_id,
                reason: "expected letters, digits and `-`".to_string(),
            });
        }
        let token = get(SANITY_TOKEN_ENV).ok_or(FetchError::MissingConfig(SANITY_TOKEN_ENV))?;
        let dataset = get(SANITY_DATASET_ENV).unwrap_or_else(|| DEFAULT_DATASET.to_string());
        let api_version =
            get(SANITY_API_VERSION_ENV).unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let secs = match get(CURRICULUM_FETCH_TIMEOUT_SECS_ENV) {
            None => DEFAULT_FETCH_TIMEOUT_SECS,
            Some(v) => v.parse::<u64>().map_err(|_| FetchError::InvalidConfig {
                name: CURRICULUM_FETCH_TIMEOUT_SECS_ENV,
                value: v.clone(),
                reason: "expected integer seconds; 0 disables".to_string(),
            })?,
        };

        Ok(Self {
            project_id,
            dataset,
            token,
            api_version,
            timeout: (secs > 0).then(|| Duration::from_secs(secs)),
        })
    }

    /// Query endpoint, without the query parameter.
    pub fn query_url(&self) -> Result<url::Url, FetchError> {
        let raw = format!(
            "https://{}.api.sanity.io/{}/data/query/{}",
            self.project_id, self.api_version, self.dataset
        );
        url::Url::parse(&raw).map_err(|e| FetchError::InvalidConfig {
            name: SANITY_DATASET_ENV,
            value: self.dataset.clone(),
            reason: format!("cannot form query URL: {e}"),
        })
    }

    /// Human-readable origin for status output.
    pub fn describe(&self) -> String {
        format!("project {} dataset {}", self.project_id, self.dataset)
    }
}

/// GROQ query selecting every curriculum document type, references unexpanded.
pub fn snapshot_query() -> String {
    let tags: Vec<String> = DocumentType::ALL
        .iter()
        .map(|t| format!("\"{}\"", t.type_tag()))
        .collect();
    format!("*[_type in [{}]] | order(_id asc)", tags.join(", "))
}

#[cfg(feature = "remote-fetch")]
pub fn fetch_snapshot(config: &FetchConfig) -> Result<serde_json::Value, FetchError> {
    let mut url = config.query_url()?;
    url.query_pairs_mut().append_pair("query", &snapshot_query());
    let shown = config.query_url()?.to_string();

    let mut builder = reqwest::blocking::Client::builder();
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().map_err(|e| FetchError::Network {
        url: shown.clone(),
        message: format!("failed to build http client: {e}"),
    })?;

    tracing::info!(url = %shown, "fetching CMS snapshot");
    let resp = client
        .get(url.as_str())
        .bearer_auth(&config.token)
        .send()
        .map_err(|e| FetchError::Network {
            url: shown.clone(),
            message: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(FetchError::Status {
            url: shown,
            status: status.as_u16(),
            body,
        });
    }

    let body: serde_json::Value = resp.json().map_err(|e| FetchError::Payload {
        url: shown.clone(),
        message: format!("invalid JSON: {e}"),
    })?;
    match body.get("result") {
        Some(serde_json::Value::Array(docs)) => {
            tracing::info!(documents = docs.len(), "fetched CMS snapshot");
            Ok(body)
        }
        _ => Err(FetchError::Payload {
            url: shown,
            message: "missing `result` array".to_string(),
        }),
    }
}

#[cfg(not(feature = "remote-fetch"))]
pub fn fetch_snapshot(_config: &FetchConfig) -> Result<serde_json::Value, FetchError> {
    Err(FetchError::Disabled)
}
