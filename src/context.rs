use serde::Serialize;

/// Opaque token history issued by the server. Sent back untouched on the next
/// request so a stateless endpoint can continue the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConversationContext(Vec<i64>);

impl ConversationContext {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl From<Vec<i64>> for ConversationContext {
    fn from(tokens: Vec<i64>) -> Self {
        Self(tokens)
    }
}

/// Holds the context produced by the last completed turn.
#[derive(Debug, Default)]
pub struct ContextTracker {
    current: ConversationContext,
}

impl ContextTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored context. Never merges.
    pub fn update(&mut self, context: ConversationContext) {
        tracing::debug!(tokens = context.len(), "conversation context replaced");
        self.current = context;
    }

    pub fn current(&self) -> &ConversationContext {
        &self.current
    }
}
