//! HTTP client for the face verification service.
//!
//! `POST {url}/verify` with `{"subjectId", "image"}` (image as base64);
//! the service answers `{"match": bool, "confidence": f64}`.

use std::time::Duration;

use domain::services::{FaceMatchOutcome, FaceMatcher};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::FaceMatchConfig;

#[derive(Debug, Error)]
pub enum FaceMatchError {
    #[error("Face match service URL not configured")]
    NotConfigured,

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Face match service error: {0}")]
    ServiceError(String),

    #[error("Invalid response from face match service: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    subject_id: Uuid,
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(rename = "match")]
    matched: bool,
    #[serde(default)]
    confidence: f64,
}

pub struct HttpFaceMatcher {
    client: Client,
    endpoint: String,
    timeout_ms: u64,
}

impl HttpFaceMatcher {
    pub fn new(config: &FaceMatchConfig) -> Result<Self, FaceMatchError> {
        let base = config.url.trim();
        if base.is_empty() {
            return Err(FaceMatchError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(FaceMatchError::Http)?;

        Ok(Self {
            client,
            endpoint: format!("{}/verify", base.trim_end_matches('/')),
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call_verify(
        &self,
        subject_id: Uuid,
        image_base64: &str,
    ) -> Result<VerifyResponse, FaceMatchError> {
        debug!(subject_id = %subject_id, url = %self.endpoint, "Calling face match service");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&VerifyRequest {
                subject_id,
                image: image_base64,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FaceMatchError::Timeout(self.timeout_ms)
                } else {
                    FaceMatchError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FaceMatchError::ServiceError(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FaceMatchError::InvalidResponse(e.to_string()))
    }
}

fn outcome_from(response: VerifyResponse) -> FaceMatchOutcome {
    if response.matched {
        FaceMatchOutcome::Matched {
            confidence: response.confidence,
        }
    } else {
        FaceMatchOutcome::Mismatched {
            confidence: response.confidence,
        }
    }
}

#[async_trait::async_trait]
impl FaceMatcher for HttpFaceMatcher {
    async fn verify(&self, subject_id: Uuid, image_base64: &str) -> FaceMatchOutcome {
        match self.call_verify(subject_id, image_base64).await {
            Ok(response) => outcome_from(response),
            Err(e) => {
                warn!(subject_id = %subject_id, error = %e, "Face match request failed");
                FaceMatchOutcome::Unavailable {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> FaceMatchConfig {
        FaceMatchConfig {
            enabled: true,
            url: url.to_string(),
            timeout_ms: 200,
            required: false,
        }
    }

    #[test]
    fn test_requires_url() {
        assert!(matches!(
            HttpFaceMatcher::new(&config("  ")),
            Err(FaceMatchError::NotConfigured)
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let matcher = HttpFaceMatcher::new(&config("http://faces.internal:9000/")).unwrap();
        assert_eq!(matcher.endpoint(), "http://faces.internal:9000/verify");
    }

    #[test]
    fn test_response_mapping() {
        let matched: VerifyResponse =
            serde_json::from_str(r#"{"match": true, "confidence": 0.91}"#).unwrap();
        assert_eq!(
            outcome_from(matched),
            FaceMatchOutcome::Matched { confidence: 0.91 }
        );

        let mismatched: VerifyResponse = serde_json::from_str(r#"{"match": false}"#).unwrap();
        assert_eq!(
            outcome_from(mismatched),
            FaceMatchOutcome::Mismatched { confidence: 0.0 }
        );
    }

    #[test]
    fn test_request_body_shape() {
        let subject_id = Uuid::nil();
        let body = serde_json::to_value(VerifyRequest {
            subject_id,
            image: "aGVsbG8=",
        })
        .unwrap();
        assert_eq!(body["subjectId"], subject_id.to_string());
        assert_eq!(body["image"], "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let matcher = HttpFaceMatcher::new(&config("http://127.0.0.1:9")).unwrap();
        let outcome = matcher.verify(Uuid::new_v4(), "aGVsbG8=").await;
        assert!(matches!(outcome, FaceMatchOutcome::Unavailable { .. }));
    }
}
