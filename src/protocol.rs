use crate::context::ConversationContext;
use serde::Serialize;

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "ConversationContext::is_empty")]
    pub context: ConversationContext,
}

impl GenerateRequest {
    pub fn new(
        model: impl Into<String>,
        prompt: impl Into<String>,
        context: ConversationContext,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            context,
        }
    }
}

/// One decoded fragment of a generation stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta(String),
    ContextFinal(ConversationContext),
    Error(String),
}
