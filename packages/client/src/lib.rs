#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the crime risk backend.
//!
//! The backend exposes two endpoints:
//!
//! * `POST /predict`: risk probability for an hour/day/month selection.
//! * `GET /heatmap_data`: aggregated incident locations for the map.
//!
//! Views depend on the [`RiskApi`] trait rather than on [`HttpRiskApi`]
//! directly so they can be driven by in-memory fakes in tests. Requests
//! are sent once: there is no retry and no cancellation.

use std::time::Duration;

use async_trait::async_trait;
use crime_risk_models::{PredictionQuery, PredictionResponse, PredictionResult};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Default backend address (the Flask development server).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Errors from backend requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Network response was not ok (HTTP {status})")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The server answered with a JSON body carrying an `error` field.
    #[error("{message}")]
    Application {
        /// Error text reported by the server.
        message: String,
    },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL the endpoint paths are appended to.
    pub base_url: String,
    /// Optional per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Reads `CRIME_RISK_BASE_URL` and `CRIME_RISK_TIMEOUT_SECS`, falling
    /// back to [`ClientConfig::default`] for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("CRIME_RISK_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout = std::env::var("CRIME_RISK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        Self { base_url, timeout }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

/// The two backend operations the views depend on.
#[async_trait]
pub trait RiskApi: Send + Sync {
    /// Submits a prediction query.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, a non-2xx status, an
    /// unparsable body, or a body carrying an `error` field.
    async fn predict(&self, query: &PredictionQuery) -> Result<PredictionResult, ApiError>;

    /// Fetches the raw incident array.
    ///
    /// The body is returned unvalidated; records are filtered by the view.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, a non-2xx status, or a
    /// body that is not JSON.
    async fn heatmap_data(&self) -> Result<Value, ApiError>;
}

/// [`RiskApi`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRiskApi {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpRiskApi {
    /// Builds a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the TLS backend cannot be initialized.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("crime-risk/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl RiskApi for HttpRiskApi {
    async fn predict(&self, query: &PredictionQuery) -> Result<PredictionResult, ApiError> {
        let url = self.config.endpoint("predict");
        log::debug!("POST {url} {query:?}");

        let resp = self.client.post(&url).json(query).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        interpret_prediction(status, &body)
    }

    async fn heatmap_data(&self) -> Result<Value, ApiError> {
        let url = self.config.endpoint("heatmap_data");
        log::debug!("GET {url}");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        interpret_heatmap(status, &body)
    }
}

/// Turns a `/predict` response into a result.
///
/// A non-2xx status wins over whatever the body says.
///
/// # Errors
///
/// Returns [`ApiError::Status`], [`ApiError::Json`] or
/// [`ApiError::Application`] as described on [`RiskApi::predict`].
pub fn interpret_prediction(status: StatusCode, body: &str) -> Result<PredictionResult, ApiError> {
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
        });
    }

    match serde_json::from_str::<PredictionResponse>(body)? {
        PredictionResponse::Success(result) => Ok(result),
        PredictionResponse::Failure { error } => Err(ApiError::Application { message: error }),
    }
}

/// Turns a `/heatmap_data` response into a raw JSON value.
///
/// # Errors
///
/// Returns [`ApiError::Status`] for non-2xx responses and
/// [`ApiError::Json`] for bodies that are not JSON.
pub fn interpret_heatmap(status: StatusCode, body: &str) -> Result<Value, ApiError> {
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
        });
    }

    Ok(serde_json::from_str(body)?)
}
