//! Error type shared by every cloud provider implementation.

use thiserror::Error;

/// Communication failures raised by a [`CloudApi`](super::CloudApi)
/// implementation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProviderError {
    /// Raised when the HTTP client cannot be configured.
    #[error("failed to build HTTP client: {message}")]
    Client {
        /// Builder error message.
        message: String,
    },
    /// Raised when the request never produced an HTTP response.
    #[error("request to {endpoint} failed: {message}")]
    Http {
        /// Endpoint path that was being called.
        endpoint: String,
        /// Transport error message.
        message: String,
    },
    /// Raised when the provider answers with a non-success status.
    #[error("provider rejected {endpoint} with status {status} ({code}): {message}")]
    Api {
        /// Endpoint path that was being called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Provider error code, for example `invalid_input`.
        code: String,
        /// Provider error message.
        message: String,
    },
    /// Raised when a success response cannot be decoded.
    #[error("failed to decode {endpoint} response: {message}")]
    Decode {
        /// Endpoint path that was being called.
        endpoint: String,
        /// Decoder error message.
        message: String,
    },
}
