use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the client. `main` decides how each one is reported.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// An `error` field reported by the server, printed to the user verbatim.
    #[error("{0}")]
    Server(String),

    #[error("server responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to parse model catalog: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("Model could not be created: {code}")]
    ModelCreation { code: i32 },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Exit status for every fatal error, -1 as seen by the parent process.
pub const FATAL_EXIT_CODE: u8 = 255;

/// Where a fatal error is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStream {
    Stdout,
    Stderr,
}

impl ClientError {
    /// Server-reported errors go to stdout like the streamed answer they
    /// interrupted; everything else belongs on stderr.
    pub fn report_stream(&self) -> ReportStream {
        match self {
            ClientError::Server(_) => ReportStream::Stdout,
            _ => ReportStream::Stderr,
        }
    }

    pub fn exit_code(&self) -> u8 {
        FATAL_EXIT_CODE
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
