/// The main error type for the azchat [`crate`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A required configuration value is unset or empty.
    #[error("Missing env var: {0}")]
    MissingEnvVar(String),

    /// Transport-level failure: connection refused, DNS, TLS, timeout or a
    /// body that could not be read.
    #[error("Network error calling Azure OpenAI: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status} error calling Azure OpenAI: {body}")]
    Http { status: u16, body: String },

    /// The response body was not a usable chat completion envelope.
    #[error("{0}")]
    Protocol(String),

    #[error("{0}")]
    StreamingNotSupported(String),

    #[error("Invalid header name {0}: {1}")]
    InvalidHeaderName(String, reqwest::header::InvalidHeaderName),

    #[error("Invalid header value for {0}: {1}")]
    InvalidHeaderValue(String, reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// Represents errors that occur during IO operations.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Represents [`crate::clients::azure_openai::ClientBuilder`] errors.
    #[error(transparent)]
    ClientBuilderError(#[from] crate::clients::azure_openai::ClientBuilderError),

    /// Represents [`crate::chat_completions::ChatCompletionRequestBuilder`] errors.
    #[error(transparent)]
    ChatCompletionRequestBuilderError(
        #[from] crate::chat_completions::ChatCompletionRequestBuilderError,
    ),
}

/// A specialized [`Result`] type for this azchat [`crate`].
///
/// This typedef is generally used to avoid writing out [`Error`] directly and
/// is otherwise a direct mapping to [`Result`].
///
/// # Examples
///
/// A convenience function that bubbles an `azchat::Result` to its caller:
///
/// ```
/// fn load() -> azchat::Result<azchat::config::Config> {
///     azchat::config::Config::from_lookup(|name| match name {
///         "AZURE_OPENAI_API_KEY" => Some("key".to_string()),
///         "AZURE_OPENAI_ENDPOINT" => Some("https://example.openai.azure.com".to_string()),
///         "AZURE_OPENAI_DEPLOYMENT" => Some("gpt-4o-mini".to_string()),
///         _ => None,
///     })
/// }
/// # load().unwrap();
/// ```
pub type Result<T> = std::result::Result<T, Error>;
