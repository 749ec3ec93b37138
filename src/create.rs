use crate::error::{ClientError, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::info;

/// Registers `name` from a model-definition file by running
/// `<program> create <name> -f <modelfile>`. The tool shares this process's
/// terminal, so its progress output is shown directly.
pub async fn create_model(program: &str, name: &str, modelfile: &Path) -> Result<()> {
    info!(program, name, modelfile = %modelfile.display(), "creating model");

    let status = Command::new(program)
        .arg("create")
        .arg(name)
        .arg("-f")
        .arg(modelfile)
        .status()
        .await
        .map_err(|source| ClientError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        // Killed by a signal leaves no code.
        Err(ClientError::ModelCreation {
            code: status.code().unwrap_or(-1),
        })
    }
}
