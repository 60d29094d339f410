pub mod gemini;
pub mod parser;
pub mod types;

pub use gemini::*;
pub use parser::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI endpoint unreachable at {0}")]
    Connection(String),

    #[error("AI request timed out after {0}s")]
    Timeout(u64),

    #[error("AI endpoint returned error (status {status}): {body}")]
    Endpoint { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),

    #[error("{0} is not set in the environment")]
    MissingApiKey(&'static str),
}
