//! HTTP enrichment client
//!
//! Posts the answers (with their question prompts) and the ranked archetypes to an
//! external text-analysis endpoint and checks the response structurally before it is
//! trusted. The client owns the wall-clock timeout.

use crate::catalog::Catalog;
use crate::config::EnrichmentConfig;
use career_compass_sdk::{
    async_trait, Answer, AnswerValue, ArchetypeView, EnrichmentError, EnrichmentResult,
    EnrichmentService,
};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Request body sent to the enrichment endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnrichmentRequest<'a> {
    content_version: &'a str,
    answers: Vec<PromptedAnswer<'a>>,
    ranked_archetypes: Vec<RankedArchetype<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptedAnswer<'a> {
    question_id: &'a str,
    prompt: &'a str,
    value: &'a AnswerValue,
}

#[derive(Debug, Serialize)]
struct RankedArchetype<'a> {
    id: &'a str,
    title: &'a str,
    score: u32,
}

/// Enrichment service reached over HTTP
pub struct HttpEnrichmentClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    catalog: Arc<Catalog>,
}

impl HttpEnrichmentClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key,
            timeout,
            catalog,
        }
    }

    /// Build a client from configuration, or fail when no endpoint is set
    pub fn from_config(
        config: &EnrichmentConfig,
        catalog: Arc<Catalog>,
    ) -> Result<Self, EnrichmentError> {
        let endpoint = config
            .url
            .clone()
            .ok_or(EnrichmentError::NotConfigured)?;
        Ok(Self::new(
            endpoint,
            config.api_key.clone(),
            config.timeout,
            catalog,
        ))
    }

    fn request_body<'a>(
        &'a self,
        answers: &'a [Answer],
        ranked: &'a [ArchetypeView],
    ) -> EnrichmentRequest<'a> {
        EnrichmentRequest {
            content_version: self.catalog.version(),
            answers: answers
                .iter()
                .map(|a| PromptedAnswer {
                    question_id: &a.question_id,
                    prompt: self
                        .catalog
                        .question(&a.question_id)
                        .map_or("", |q| q.prompt.as_str()),
                    value: &a.value,
                })
                .collect(),
            ranked_archetypes: ranked
                .iter()
                .map(|v| RankedArchetype {
                    id: v.id(),
                    title: v.title(),
                    score: v.score,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl EnrichmentService for HttpEnrichmentClient {
    async fn enrich(
        &self,
        answers: &[Answer],
        ranked: &[ArchetypeView],
    ) -> Result<EnrichmentResult, EnrichmentError> {
        let body = self.request_body(answers, ranked);

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        debug!(endpoint = %self.endpoint, answers = answers.len(), "requesting enrichment");

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| EnrichmentError::Timeout)?
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichmentError::Timeout
                } else {
                    EnrichmentError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Service {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let value = tokio::time::timeout(self.timeout, response.json::<serde_json::Value>())
            .await
            .map_err(|_| EnrichmentError::Timeout)?
            .map_err(|e| EnrichmentError::MalformedResponse(e.to_string()))?;

        let result = EnrichmentResult::from_value(value)?;
        info!(
            sections = ?result.sections().collect::<Vec<_>>(),
            "enrichment response accepted"
        );
        Ok(result)
    }
}
