use super::session::CallId;

/// A request to retrieve supporting passages for a tool call.
///
/// Carries the call id purely for log correlation on the retrieval side;
/// the query itself is stateless.
#[derive(Debug, Clone)]
pub struct KnowledgeQuery {
    pub text: String,
    pub knowledge_base_id: String,
    pub call_id: CallId,
}

impl KnowledgeQuery {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        knowledge_base_id: impl Into<String>,
        call_id: CallId,
    ) -> Self {
        Self {
            text: text.into(),
            knowledge_base_id: knowledge_base_id.into(),
            call_id,
        }
    }
}

/// One retrieved passage, scored for relevance to a `KnowledgeQuery`.
#[derive(Debug, Clone)]
pub struct KnowledgeHit {
    pub text: String,
    /// Relevance in `[0.0, 1.0]`; higher is more relevant.
    pub score: f32,
    pub source: Option<String>,
}
