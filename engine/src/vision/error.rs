use thiserror::Error;

/// Errors returned by an image-understanding backend
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("No network connectivity to Google API servers")]
    NoConnectivity,

    #[error("No response received from model")]
    EmptyResponse,

    #[error("Prompt blocked by the model: {reason}")]
    Blocked { reason: String },

    #[error("Gemini error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}
