//! Terminal client for a local Ollama server.
//!
//! A turn posts the prompt together with the context returned by the previous
//! turn, then decodes the newline-delimited JSON reply as it streams in,
//! printing text as soon as each fragment arrives.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod context;
pub mod create;
pub mod decoder;
pub mod error;
pub mod protocol;
pub mod repl;
pub mod session;
pub mod transport;

pub use catalog::ModelCatalog;
pub use config::ClientConfig;
pub use context::{ContextTracker, ConversationContext};
pub use decoder::StreamDecoder;
pub use error::{ClientError, Result};
pub use protocol::{GenerateRequest, StreamEvent};
pub use repl::Repl;
pub use session::{Session, TurnOutcome};
pub use transport::Transport;
