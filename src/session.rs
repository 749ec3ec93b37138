use crate::context::{ContextTracker, ConversationContext};
use crate::decoder::{decode_stream, find_error};
use crate::error::{ClientError, Result};
use crate::protocol::{GenerateRequest, StreamEvent};
use crate::transport::Transport;
use futures::StreamExt;
use std::io::Write;
use tracing::debug;

/// Conversation state for one run of the client: the chosen model and the
/// context returned by the last turn.
#[derive(Debug)]
pub struct Session {
    model: String,
    context: ContextTracker,
}

/// What a completed turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub answer: String,
    pub context_updated: bool,
}

impl Session {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            context: ContextTracker::new(),
        }
    }

    pub fn context(&self) -> &ConversationContext {
        self.context.current()
    }

    /// Sends `prompt` with the current context and writes the answer to `out`
    /// as it streams in. The context is replaced only if the stream carried
    /// one and finished without an error.
    pub async fn run_turn<W: Write>(
        &mut self,
        transport: &Transport,
        prompt: &str,
        out: &mut W,
    ) -> Result<TurnOutcome> {
        let request = GenerateRequest::new(&self.model, prompt, self.context.current().clone());
        let reply = transport.generate(&request).await?;

        if !reply.status.is_success() {
            let status = reply.status;
            let body = reply.text().await?;
            return Err(match find_error(&body) {
                Some(message) => ClientError::Server(message),
                None => ClientError::Status { status, body },
            });
        }

        let mut events = Box::pin(decode_stream(reply.body));
        let mut answer = String::new();
        let mut latest_context = None;

        while let Some(event) = events.next().await {
            match event? {
                StreamEvent::TextDelta(text) => {
                    out.write_all(text.as_bytes())?;
                    out.flush()?;
                    answer.push_str(&text);
                }
                StreamEvent::ContextFinal(context) => latest_context = Some(context),
                StreamEvent::Error(message) => {
                    debug!(%message, "server reported an error mid-stream");
                    return Err(ClientError::Server(message));
                }
            }
        }

        let context_updated = latest_context.is_some();
        if let Some(context) = latest_context {
            self.context.update(context);
        }

        debug!(chars = answer.len(), context_updated, "turn complete");
        Ok(TurnOutcome {
            answer,
            context_updated,
        })
    }
}
