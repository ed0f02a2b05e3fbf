//! Penguin Statistics REST API client
//!
//! HTTP client for the report, matrix, stage and planner endpoints.
//! Requests go out once; there is no retry or caching layer.

use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PenguinError, PenguinResult};
use crate::matrix::DropMatrix;
use crate::types::{DropReport, PlannerPlan, PlannerRequest, Server, Stage};

/// Default API root
pub const BASE_URL: &str = "https://penguin-stats.io/PenguinStats/api/v2";

/// Default planner endpoint
pub const PLANNER_URL: &str = "https://planner.penguin-stats.io/plan";

/// Penguin Statistics REST API client
pub struct PenguinClient {
    client: Client,
    config: ClientConfig,
}

/// Configuration for the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Full URL of the planner endpoint
    #[serde(default = "default_planner_url")]
    pub planner_url: String,
    /// Request and connect timeout in seconds, 0 for none
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Reporting source name, also sent as User-Agent on reports
    #[serde(default)]
    pub source: Option<String>,
    /// Version of the reporting source
    #[serde(default)]
    pub version: Option<String>,
}

fn default_base_url() -> String {
    BASE_URL.to_string()
}

fn default_planner_url() -> String {
    PLANNER_URL.to_string()
}

fn default_timeout() -> u64 {
    5
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            planner_url: default_planner_url(),
            timeout_secs: default_timeout(),
            source: None,
            version: None,
        }
    }
}

/// Options for a matrix query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixQuery {
    pub server: Server,
    pub show_closed_zones: bool,
    /// Restrict results to the reports of `user_id`
    pub is_personal: bool,
    /// Sent as the `userID` cookie when set
    pub user_id: Option<String>,
}

impl MatrixQuery {
    pub fn new(server: Server) -> Self {
        Self {
            server,
            ..Self::default()
        }
    }

    /// Builder method: include zones that are no longer open
    pub fn show_closed_zones(mut self, show: bool) -> Self {
        self.show_closed_zones = show;
        self
    }

    /// Builder method: attach a user id without changing scope
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Builder method: query the personal matrix of `user_id`
    pub fn personal(mut self, user_id: impl Into<String>) -> Self {
        self.is_personal = true;
        self.user_id = Some(user_id.into());
        self
    }

    fn validate(&self) -> PenguinResult<()> {
        let has_user = self.user_id.as_deref().is_some_and(|id| !id.is_empty());
        if self.is_personal && !has_user {
            return Err(PenguinError::InvalidParameter(
                "personal stats requested but no user id provided".to_string(),
            ));
        }
        Ok(())
    }
}

impl PenguinClient {
    /// Create a new client with the given configuration
    ///
    /// A `timeout_secs` of 0 disables the timeout.
    pub fn new(config: ClientConfig) -> PenguinResult<Self> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            let timeout = Duration::from_secs(config.timeout_secs);
            builder = builder.timeout(timeout).connect_timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Submit a drop report, returning the report hash
    ///
    /// The hash can be passed to [`recall_report`](Self::recall_report)
    /// within 24 hours of submission.
    pub async fn report_drop(&self, report: &DropReport) -> PenguinResult<String> {
        let url = self.endpoint("/report");
        let request = with_source(self.client.post(&url).json(report), report.source.as_deref());

        tracing::debug!(
            stage_id = %report.stage_id,
            server = %report.server,
            drops = report.drops.len(),
            "Submitting drop report"
        );

        let response = send(request).await?;
        let response = check_status(response, |status| status == StatusCode::CREATED).await?;
        let body: ReportResponse = decode(response).await?;

        body.report_hash
            .filter(|hash| !hash.is_empty())
            .ok_or(PenguinError::MissingField("reportHash"))
    }

    /// Recall a report previously returned by [`report_drop`](Self::report_drop)
    pub async fn recall_report(&self, report_hash: &str, source: Option<&str>) -> PenguinResult<()> {
        let url = self.endpoint("/report/recall");
        let body = RecallRequest { report_hash };
        let request = with_source(self.client.post(&url).json(&body), source);

        tracing::debug!(report_hash, "Recalling drop report");

        let response = send(request).await?;
        check_status(response, |status| status == StatusCode::OK).await?;
        Ok(())
    }

    /// Fetch the global drop matrix for a server (CN when `None`)
    pub async fn get_matrix(&self, server: Option<Server>) -> PenguinResult<DropMatrix> {
        self.get_matrix_with(&MatrixQuery::new(server.unwrap_or_default()))
            .await
    }

    /// Fetch the drop matrix with explicit options
    ///
    /// The returned matrix is unindexed.
    pub async fn get_matrix_with(&self, query: &MatrixQuery) -> PenguinResult<DropMatrix> {
        query.validate()?;

        let url = self.endpoint("/result/matrix");
        let mut request = self.client.get(&url).query(&[
            ("server", query.server.as_str().to_string()),
            ("show_closed_zones", query.show_closed_zones.to_string()),
            ("is_personal", query.is_personal.to_string()),
        ]);

        if let Some(user_id) = query.user_id.as_deref().filter(|id| !id.is_empty()) {
            request = request.header(COOKIE, format!("userID={}", user_id));
        }

        tracing::debug!(
            server = %query.server,
            show_closed_zones = query.show_closed_zones,
            is_personal = query.is_personal,
            "Fetching drop matrix"
        );

        let response = send(request).await?;
        let response = check_status(response, |status| status.is_success()).await?;
        let matrix: DropMatrix = decode(response).await?;

        tracing::debug!(records = matrix.len(), "Drop matrix received");
        Ok(matrix)
    }

    /// Fetch metadata for every stage on a server
    pub async fn get_stages(&self, server: Server) -> PenguinResult<Vec<Stage>> {
        let url = self.endpoint("/stages");
        let request = self.client.get(&url).query(&[("server", server.as_str())]);

        tracing::debug!(server = %server, "Fetching stages");

        let response = send(request).await?;
        let response = check_status(response, |status| status.is_success()).await?;
        decode(response).await
    }

    /// Ask the planner for a farming plan
    pub async fn plan(&self, request: &PlannerRequest) -> PenguinResult<PlannerPlan> {
        let builder = self.client.post(&self.config.planner_url).json(request);

        tracing::debug!(
            server = %request.server,
            required = request.required.len(),
            "Requesting farming plan"
        );

        let response = send(builder).await?;
        let response = check_status(response, |status| status.is_success()).await?;
        decode(response).await
    }
}

fn with_source(request: RequestBuilder, source: Option<&str>) -> RequestBuilder {
    match source.filter(|s| !s.is_empty()) {
        Some(source) => request.header(USER_AGENT, source),
        None => request,
    }
}

async fn send(request: RequestBuilder) -> PenguinResult<Response> {
    request.send().await.map_err(PenguinError::from_transport)
}

/// Pass the response through if `accepted(status)`, otherwise turn it
/// into `UnexpectedStatus` carrying the body text
async fn check_status(response: Response, accepted: fn(StatusCode) -> bool) -> PenguinResult<Response> {
    let status = response.status();
    if accepted(status) {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "Penguin Statistics returned unexpected status");

    Err(PenguinError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> PenguinResult<T> {
    let bytes = response.bytes().await.map_err(PenguinError::from_transport)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        let body = String::from_utf8_lossy(&bytes);
        PenguinError::Decode(format!("{}: {}", e, body))
    })
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecallRequest<'a> {
    report_hash: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    #[serde(default)]
    report_hash: Option<String>,
}
