use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use querylane_core::config::Ga4Config;
use querylane_core::ga4::report::{RunReportRequest, RunReportResponse};
use querylane_core::{ApplicationError, Report, ValidatedPlan};
use serde::{Deserialize, Serialize};

pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// GA4 Data API seam. Only a [`ValidatedPlan`] can be submitted.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    async fn run_report(
        &self,
        property_id: &str,
        plan: &ValidatedPlan,
    ) -> Result<Report, ApplicationError>;
}

/// The subset of a Google service-account key file needed for the
/// JWT-bearer grant.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub async fn from_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|error| {
            ApplicationError::Configuration(format!(
                "GA4 credentials file `{}` could not be read: {error}",
                path.display()
            ))
        })?;
        Self::from_json(&raw).map_err(|error| {
            ApplicationError::Configuration(format!(
                "GA4 credentials file `{}` is invalid: {error}",
                path.display()
            ))
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Signs the RS256 assertion exchanged for an access token.
    pub fn signed_assertion(&self, issued_at: i64) -> Result<String, ApplicationError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: ANALYTICS_READONLY_SCOPE,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(|error| {
            ApplicationError::Configuration(format!("GA4 private key is not valid RSA PEM: {error}"))
        })?;
        jsonwebtoken::encode(&header, &claims, &key).map_err(|error| {
            ApplicationError::Configuration(format!("failed to sign GA4 assertion: {error}"))
        })
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct GoogleErrorEnvelope {
    #[serde(default)]
    error: GoogleError,
}

#[derive(Debug, Default, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
}

/// GA4 Data API client. Credentials are read from disk on every call so a
/// rotated key file takes effect without a restart.
#[derive(Clone, Debug)]
pub struct Ga4Client {
    http: reqwest::Client,
    credentials_path: PathBuf,
    api_base_url: String,
}

impl Ga4Client {
    pub fn from_config(config: &Ga4Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build GA4 http client")?;

        Ok(Self {
            http,
            credentials_path: config.credentials_path.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn access_token(&self, key: &ServiceAccountKey) -> Result<String, ApplicationError> {
        let assertion = key.signed_assertion(chrono::Utc::now().timestamp())?;
        let response = self
            .http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|error| ApplicationError::integration(format!("GA4 token request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ApplicationError::Integration(format!(
                "GA4 token exchange returned {status}: {}",
                detail.chars().take(300).collect::<String>()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|error| {
            ApplicationError::integration(format!("GA4 token response was not understood: {error}"))
        })?;
        Ok(token.access_token)
    }

    fn report_endpoint(&self, property_id: &str) -> String {
        let property = property_id.trim();
        let property = property.strip_prefix("properties/").unwrap_or(property);
        format!("{}/v1beta/properties/{property}:runReport", self.api_base_url)
    }
}

#[async_trait]
impl AnalyticsBackend for Ga4Client {
    async fn run_report(
        &self,
        property_id: &str,
        plan: &ValidatedPlan,
    ) -> Result<Report, ApplicationError> {
        let key = ServiceAccountKey::from_file(&self.credentials_path).await?;
        let token = self.access_token(&key).await?;

        let response = self
            .http
            .post(self.report_endpoint(property_id))
            .bearer_auth(token)
            .json(&RunReportRequest::from(plan))
            .send()
            .await
            .map_err(|error| ApplicationError::integration(format!("GA4 request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .ok()
                .filter(|message| !message.is_empty())
                .unwrap_or(body);
            return Err(ApplicationError::Integration(format!("GA4 returned {status}: {message}")));
        }

        let payload: RunReportResponse = response.json().await.map_err(|error| {
            ApplicationError::integration(format!("GA4 response was not understood: {error}"))
        })?;
        let report = payload.into_report(plan);

        tracing::debug!(
            event_name = "ga4.report.completed",
            property_id = %property_id,
            rows = report.row_count(),
            "GA4 report completed"
        );
        Ok(report)
    }
}
