//! HTTP adapter for `KnowledgeServicePort`.
//!
//! The concrete retrieval backend (indexing, ranking, storage) is an
//! external collaborator out of scope for this repository; this client is
//! the one seam the bridge needs in order to run end to end against it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use voicebridge_core::{KnowledgeError, KnowledgeHit, KnowledgeQuery, KnowledgeServicePort};

#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    text: &'a str,
    #[serde(rename = "knowledgeBaseId")]
    knowledge_base_id: &'a str,
    #[serde(rename = "sessionId")]
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct RetrieveHit {
    text: String,
    score: f32,
    #[serde(default)]
    source: Option<String>,
}

/// Calls `POST {base_url}/retrieve` and expects a JSON array of hits back.
pub struct HttpKnowledgeClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpKnowledgeClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl KnowledgeServicePort for HttpKnowledgeClient {
    async fn retrieve(&self, query: KnowledgeQuery) -> Result<Vec<KnowledgeHit>, KnowledgeError> {
        let url = format!("{}/retrieve", self.base_url);
        let body = RetrieveRequest {
            text: &query.text,
            knowledge_base_id: &query.knowledge_base_id,
            session_id: query.call_id.as_str(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    KnowledgeError::Timeout
                } else {
                    KnowledgeError::Unavailable(error.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(KnowledgeError::Unavailable(format!(
                "retrieval backend returned {}",
                response.status()
            )));
        }

        let hits: Vec<RetrieveHit> = response
            .json()
            .await
            .map_err(|error| KnowledgeError::Unavailable(error.to_string()))?;

        Ok(hits
            .into_iter()
            .map(|hit| KnowledgeHit {
                text: hit.text,
                score: hit.score,
                source: hit.source,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieve_request_serializes_expected_field_names() {
        let query = KnowledgeQuery::new("vacation policy", "kb-policies", voicebridge_core::CallId::new("CA1"));
        let body = RetrieveRequest {
            text: &query.text,
            knowledge_base_id: &query.knowledge_base_id,
            session_id: query.call_id.as_str(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"knowledgeBaseId\":\"kb-policies\""));
        assert!(json.contains("\"sessionId\":\"CA1\""));
    }
}
