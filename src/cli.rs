use crate::config::{DEFAULT_HOST, DEFAULT_OLLAMA_BIN};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "ollama-chat")]
#[command(about = "Chat with a local Ollama server from the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Name of a model to create before chatting
    pub model: Option<String>,

    /// Model-definition file used to create MODEL
    pub modelfile: Option<PathBuf>,

    /// Base URL of the server
    #[arg(long, env = "OLLAMA_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Command used to create models
    #[arg(long, env = "OLLAMA_BIN", default_value = DEFAULT_OLLAMA_BIN)]
    pub ollama_bin: String,
}

impl Cli {
    /// The model to create at startup. Both positionals must be present and
    /// non-blank, otherwise creation is skipped.
    pub fn creation_request(&self) -> Option<(&str, &Path)> {
        let model = self.model.as_deref()?;
        let modelfile = self.modelfile.as_deref()?;

        if model.trim().is_empty() || modelfile.as_os_str().to_string_lossy().trim().is_empty() {
            return None;
        }

        Some((model, modelfile))
    }
}
