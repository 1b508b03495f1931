//! Handing a finished listing to the submission endpoint

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::drafts::DraftMap;
use crate::error::SubmitError;

/// The payload sent when the review gate is passed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSubmission {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    /// Origin the drafts were collected under
    pub origin: String,
    /// Canonical record of every step
    pub steps: DraftMap,
}

impl ListingSubmission {
    pub fn new(origin: &str, steps: DraftMap) -> Self {
        Self {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            origin: origin.to_string(),
            steps,
        }
    }
}

/// Acknowledgement from the endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub status: u16,
}

#[async_trait]
pub trait Submitter: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn submit(&self, listing: &ListingSubmission) -> Result<SubmissionReceipt, SubmitError>;
}

const USER_AGENT: &str = concat!("listing-wizard/", env!("CARGO_PKG_VERSION"));

/// POSTs the listing as JSON to a configured endpoint
pub struct HttpSubmitter {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpSubmitter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read the bearer token from `var` when it is set and non-empty
    pub fn with_token_from_env(self, var: &str) -> Self {
        match env::var(var) {
            Ok(token) if !token.is_empty() => self.with_token(token),
            _ => self,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit(&self, listing: &ListingSubmission) -> Result<SubmissionReceipt, SubmitError> {
        let mut request = self.client.post(&self.endpoint).json(listing);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(
                id = %listing.id,
                status = status.as_u16(),
                endpoint = %self.endpoint,
                "Listing submitted"
            );
            Ok(SubmissionReceipt {
                id: listing.id,
                status: status.as_u16(),
            })
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(SubmitError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Stand-in used when no endpoint is configured
#[derive(Debug, Default)]
pub struct UnconfiguredSubmitter;

#[async_trait]
impl Submitter for UnconfiguredSubmitter {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn submit(&self, _listing: &ListingSubmission) -> Result<SubmissionReceipt, SubmitError> {
        Err(SubmitError::NotConfigured)
    }
}
