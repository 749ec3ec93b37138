use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::protocol::GenerateRequest;
use futures::{Stream, StreamExt};
use reqwest::{Client as HttpClient, StatusCode};
use std::pin::Pin;
use tracing::{debug, info};

/// Response body as it arrives off the wire.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Status plus a body that has not been read yet.
pub struct HttpReply {
    pub status: StatusCode,
    pub body: BodyStream,
}

impl HttpReply {
    fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ClientError::from))
            .boxed();
        Self { status, body }
    }

    /// Reads the whole body. Only meant for small documents such as the
    /// catalog or an error reply.
    pub async fn text(mut self) -> Result<String> {
        let mut raw = Vec::new();
        while let Some(chunk) = self.body.next().await {
            raw.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    base_url: String,
    http: HttpClient,
}

impl Transport {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            base_url: config.base_url,
            http: HttpClient::new(),
        }
    }

    /// Starts a generation. The body is handed back unread so the caller can
    /// decode it while the server is still producing it.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<HttpReply> {
        let url = format!("{}/api/generate", self.base_url);
        info!(
            model = %request.model,
            context_tokens = request.context.len(),
            "sending generation request"
        );

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        debug!(%url, status = %response.status(), "generation response started");
        Ok(HttpReply::from_response(response))
    }

    pub async fn list_models(&self) -> Result<HttpReply> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.http.get(&url).send().await?;

        debug!(%url, status = %response.status(), "catalog response");
        Ok(HttpReply::from_response(response))
    }
}
