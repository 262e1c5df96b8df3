//! Error types for Phaser documentation access

use thiserror::Error;

/// Errors that can occur while fetching, parsing, or converting documentation
///
/// Every public operation in this crate returns `Result<T, DocsError>` so
/// callers only ever deal with this closed set of failure kinds.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Malformed or disallowed input, or a response that failed security checks
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport-level failure (timeout, connect failure, unexpected error)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP error: {0}")]
    Http(String),

    /// Rate limited after exhausting the retry budget
    #[error("Rate limit error: {0}")]
    RateLimit(String),

    /// HTML parsing failure (bad input type, oversized input, unparseable document)
    #[error("HTML parse error: {0}")]
    HtmlParse(String),

    /// Markdown conversion failure
    #[error("Markdown conversion error: {0}")]
    MarkdownConversion(String),
}

impl DocsError {
    /// Classify a reqwest error as a transport failure with a stable prefix
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            DocsError::Network(format!("Request timeout: {err}"))
        } else if err.is_connect() {
            DocsError::Network(format!("Connection error: {err}"))
        } else {
            DocsError::Network(format!("Request error: {err}"))
        }
    }

    /// True for failures the retry engine should not attempt again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DocsError::Validation(_)
                | DocsError::RateLimit(_)
                | DocsError::HtmlParse(_)
                | DocsError::MarkdownConversion(_)
        )
    }
}
