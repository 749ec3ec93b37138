use crate::decoder::find_error;
use crate::error::{ClientError, Result};
use crate::transport::Transport;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Resolves model names against the server's list of local models.
pub struct ModelCatalog<'a> {
    transport: &'a Transport,
}

impl<'a> ModelCatalog<'a> {
    pub fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    /// Base names of every local model, in catalog order, one entry per base
    /// model even when several tags of it are installed.
    pub async fn list_base_names(&self) -> Result<Vec<String>> {
        let reply = self.transport.list_models().await?;

        if !reply.status.is_success() {
            let status = reply.status;
            let body = reply.text().await?;
            return Err(match find_error(&body) {
                Some(message) => ClientError::Server(message),
                None => ClientError::Status { status, body },
            });
        }

        let body = reply.text().await?;
        let names = base_names(&body)?;
        debug!(count = names.len(), "fetched model catalog");
        Ok(names)
    }

    /// Fetches the catalog on every call; nothing is cached.
    pub async fn is_available(&self, name: &str) -> Result<bool> {
        let names = self.list_base_names().await?;
        Ok(names.iter().any(|candidate| candidate == name))
    }
}

/// Collects every non-empty string `model` field in the document, reduced to the part
/// before the first `:` and deduplicated.
pub fn base_names(document: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(document)?;

    let mut models = Vec::new();
    collect_model_fields(&value, &mut models);

    let mut seen = HashSet::new();
    Ok(models
        .into_iter()
        .map(base_name)
        .filter(|name| seen.insert(name.clone()))
        .collect())
}

pub fn base_name(full_name: &str) -> String {
    full_name
        .split_once(':')
        .map(|(base, _tag)| base)
        .unwrap_or(full_name)
        .to_string()
}

fn collect_model_fields<'v>(value: &'v Value, out: &mut Vec<&'v str>) {
    match value {
        Value::Object(fields) => {
            for (key, field) in fields {
                match field {
                    Value::String(name) if key == "model" && !name.is_empty() => out.push(name),
                    _ => collect_model_fields(field, out),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_model_fields(item, out);
            }
        }
        _ => {}
    }
}
