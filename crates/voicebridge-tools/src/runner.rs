//! Bridges `ModelDriver`'s `toolUse` events to the knowledge retrieval
//! collaborator and back into `toolResult` events.
//!
//! One `ToolRunner` is constructed per session by `SessionCoordinator` and
//! serializes its own tool calls: `execute` takes an internal lock for its
//! whole duration, so a second `toolUse` arriving while one is outstanding
//! simply waits rather than racing it onto the wire out of order.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use voicebridge_core::{
    AppEventEmitter, BridgeEvent, CallId, KnowledgeQuery, KnowledgeServicePort, ToolConfig,
    ToolDirectoryPort, ToolRequest, ToolResult, ToolStatus,
};

const NO_INFORMATION_FOUND: &str = "No information found";
const RETRIEVAL_UNAVAILABLE: &str = "I was unable to retrieve that information at the moment.";
const INVALID_QUERY: &str = "Invalid query parameter";

pub struct ToolRunner {
    call_id: CallId,
    knowledge: Arc<dyn KnowledgeServicePort>,
    directory: Arc<dyn ToolDirectoryPort>,
    config: ToolConfig,
    emitter: Arc<dyn AppEventEmitter>,
    inflight: Mutex<()>,
}

impl ToolRunner {
    #[must_use]
    pub fn new(
        call_id: CallId,
        knowledge: Arc<dyn KnowledgeServicePort>,
        directory: Arc<dyn ToolDirectoryPort>,
        config: ToolConfig,
        emitter: Arc<dyn AppEventEmitter>,
    ) -> Self {
        Self {
            call_id,
            knowledge,
            directory,
            config,
            emitter,
            inflight: Mutex::new(()),
        }
    }

    /// Run one tool call to completion and return the `ToolResult` to send
    /// back on the model stream. Never fails outright: every failure mode
    /// degrades to a `ToolResult` with `status: error` and a message safe
    /// to speak, per the tool-execution-failure error class.
    pub async fn execute(&self, request: ToolRequest) -> ToolResult {
        let _serialize = self.inflight.lock().await;

        self.emitter.emit(BridgeEvent::ToolInvoked {
            call_id: self.call_id.clone(),
            tool_name: request.name.clone(),
        });

        let result = self.execute_inner(&request).await;
        if result.status == ToolStatus::Error {
            self.emitter.emit(BridgeEvent::ToolFailed {
                call_id: self.call_id.clone(),
                tool_name: request.name.clone(),
                error: result.content.clone(),
            });
        }
        result
    }

    async fn execute_inner(&self, request: &ToolRequest) -> ToolResult {
        let Some(query) = request
            .input
            .as_object()
            .and_then(|obj| obj.get("query"))
            .and_then(|v| v.as_str())
            .filter(|q| !q.is_empty())
        else {
            return ToolResult::error(request.id.clone(), INVALID_QUERY);
        };

        let Some(knowledge_base_id) = self.directory.resolve_knowledge_base(&request.name) else {
            return ToolResult::error(
                request.id.clone(),
                format!("Unknown tool: {}", request.name),
            );
        };

        let deadline = Duration::from_millis(u64::from(self.config.timeout_ms));
        let query = KnowledgeQuery::new(query, knowledge_base_id, self.call_id.clone());
        let hits = match tokio::time::timeout(deadline, self.knowledge.retrieve(query)).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(error)) => {
                tracing::warn!(call_id = %self.call_id, tool = %request.name, %error, "knowledge retrieval failed");
                return ToolResult::error(request.id.clone(), RETRIEVAL_UNAVAILABLE);
            }
            Err(_elapsed) => {
                tracing::warn!(call_id = %self.call_id, tool = %request.name, "knowledge retrieval timed out");
                return ToolResult::error(request.id.clone(), RETRIEVAL_UNAVAILABLE);
            }
        };

        let mut filtered: Vec<_> = hits
            .into_iter()
            .filter(|hit| hit.score >= self.config.min_relevance_score)
            .collect();
        filtered.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        filtered.truncate(self.config.max_results as usize);

        if filtered.is_empty() {
            return ToolResult::error(request.id.clone(), NO_INFORMATION_FOUND);
        }

        let content = filtered
            .iter()
            .map(|hit| hit.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        ToolResult::success(request.id.clone(), content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticToolDirectory;
    use async_trait::async_trait;
    use serde_json::json;
    use voicebridge_core::{KnowledgeError, KnowledgeHit, NoopEmitter, ToolDescriptor};

    struct StubKnowledge {
        hits: Vec<KnowledgeHit>,
    }

    #[async_trait]
    impl KnowledgeServicePort for StubKnowledge {
        async fn retrieve(
            &self,
            _query: KnowledgeQuery,
        ) -> Result<Vec<KnowledgeHit>, KnowledgeError> {
            Ok(self.hits.clone())
        }
    }

    struct TimeoutKnowledge;

    #[async_trait]
    impl KnowledgeServicePort for TimeoutKnowledge {
        async fn retrieve(
            &self,
            _query: KnowledgeQuery,
        ) -> Result<Vec<KnowledgeHit>, KnowledgeError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("test timeout should fire first")
        }
    }

    fn directory() -> Arc<dyn ToolDirectoryPort> {
        Arc::new(StaticToolDirectory::new(vec![(
            ToolDescriptor {
                name: "company_policies".into(),
                description: "look up company policy documents".into(),
                input_schema: json!({"type": "object"}),
            },
            "kb-policies".into(),
        )]))
    }

    fn runner(knowledge: Arc<dyn KnowledgeServicePort>, config: ToolConfig) -> ToolRunner {
        ToolRunner::new(
            CallId::new("CA1"),
            knowledge,
            directory(),
            config,
            Arc::new(NoopEmitter::new()),
        )
    }

    #[tokio::test]
    async fn successful_lookup_concatenates_top_hits_by_score() {
        let knowledge = Arc::new(StubKnowledge {
            hits: vec![
                KnowledgeHit {
                    text: "low relevance".into(),
                    score: 0.4,
                    source: None,
                },
                KnowledgeHit {
                    text: "most relevant".into(),
                    score: 0.9,
                    source: None,
                },
                KnowledgeHit {
                    text: "somewhat relevant".into(),
                    score: 0.6,
                    source: None,
                },
            ],
        });
        let runner = runner(knowledge, ToolConfig::default());

        let result = runner
            .execute(ToolRequest {
                id: "T1".into(),
                name: "company_policies".into(),
                input: json!({"query": "vacation policy"}),
            })
            .await;

        assert_eq!(result.status, ToolStatus::Success);
        assert!(result.content.starts_with("most relevant"));
        assert!(!result.content.contains("low relevance"));
    }

    #[tokio::test]
    async fn missing_query_field_is_an_error_without_calling_knowledge() {
        let knowledge = Arc::new(StubKnowledge { hits: vec![] });
        let runner = runner(knowledge, ToolConfig::default());

        let result = runner
            .execute(ToolRequest {
                id: "T1".into(),
                name: "company_policies".into(),
                input: json!({"notquery": "x"}),
            })
            .await;

        assert_eq!(result.status, ToolStatus::Error);
        assert_eq!(result.content, INVALID_QUERY);
    }

    #[tokio::test]
    async fn unresolved_tool_name_is_an_error() {
        let knowledge = Arc::new(StubKnowledge { hits: vec![] });
        let runner = runner(knowledge, ToolConfig::default());

        let result = runner
            .execute(ToolRequest {
                id: "T1".into(),
                name: "not_a_real_tool".into(),
                input: json!({"query": "hi"}),
            })
            .await;

        assert_eq!(result.status, ToolStatus::Error);
    }

    #[tokio::test]
    async fn empty_filtered_hits_reports_no_information_found() {
        let knowledge = Arc::new(StubKnowledge {
            hits: vec![KnowledgeHit {
                text: "barely related".into(),
                score: 0.1,
                source: None,
            }],
        });
        let runner = runner(knowledge, ToolConfig::default());

        let result = runner
            .execute(ToolRequest {
                id: "T1".into(),
                name: "company_policies".into(),
                input: json!({"query": "vacation policy"}),
            })
            .await;

        assert_eq!(result.status, ToolStatus::Error);
        assert_eq!(result.content, NO_INFORMATION_FOUND);
    }

    #[tokio::test]
    async fn retrieval_timeout_degrades_to_apology_result() {
        tokio::time::pause();
        let mut config = ToolConfig::default();
        config.timeout_ms = 10;
        let runner = runner(Arc::new(TimeoutKnowledge), config);

        let call = runner.execute(ToolRequest {
            id: "T1".into(),
            name: "company_policies".into(),
            input: json!({"query": "vacation policy"}),
        });
        tokio::time::advance(Duration::from_millis(20)).await;
        let result = call.await;

        assert_eq!(result.status, ToolStatus::Error);
        assert_eq!(result.content, RETRIEVAL_UNAVAILABLE);
    }
}
