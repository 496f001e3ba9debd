use std::str::FromStr;
use std::time::Duration;

use crate::chat_completions::{ChatCompletion, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::Config;
use crate::utils::uri::ensure_no_trailing_slash;
use crate::{Error, Result};
use async_trait::async_trait;
use derive_builder::Builder;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 10);

#[derive(Debug, Clone, Builder)]
#[builder(derive(Debug))]
#[builder(setter(into))]
pub struct Client {
    #[builder(default)]
    http_client: reqwest::Client,
    api_version: String,
    base_url: String,
    /// Azure routes by deployment id rather than by model name.
    deployment: String,
    auth: Auth,
}

#[derive(Debug, Clone)]
pub enum Auth {
    BearerToken(SecretString),
    ApiKey(SecretString),
}

/// Transport settings that are not part of [`Config`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    /// Skip TLS certificate verification. Only meant for local proxies.
    pub insecure: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            insecure: false,
        }
    }
}

impl Client {
    pub fn new(config: &Config, options: &ClientOptions) -> Result<Self> {
        if options.insecure {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let http_client = reqwest::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.insecure)
            .build()?;

        Ok(Self {
            http_client,
            api_version: config.api_version.clone(),
            base_url: ensure_no_trailing_slash(config.endpoint.as_str()),
            deployment: config.deployment.clone(),
            auth: Auth::ApiKey(config.api_key.clone()),
        })
    }

    pub fn chat_completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            ensure_no_trailing_slash(self.base_url.as_str()),
            self.deployment,
            self.api_version
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let (auth_header_key, mut auth_header_value) = match &self.auth {
            Auth::BearerToken(secret_box) => (
                reqwest::header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", secret_box.expose_secret()))
                    .map_err(|e| {
                        Error::InvalidHeaderValue(reqwest::header::AUTHORIZATION.to_string(), e)
                    })?,
            ),
            Auth::ApiKey(secret_box) => (
                HeaderName::from_str("api-key")
                    .map_err(|e| Error::InvalidHeaderName("api-key".to_owned(), e))?,
                HeaderValue::from_str(secret_box.expose_secret())
                    .map_err(|e| Error::InvalidHeaderValue("api-key".to_string(), e))?,
            ),
        };
        auth_header_value.set_sensitive(true);
        headers.insert(auth_header_key, auth_header_value);

        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }
}

#[async_trait]
impl ChatCompletion for Client {
    async fn chat_completions(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        if request.stream == Some(true) {
            return Err(Error::StreamingNotSupported(
                "Streaming is not supported when using chat_completions() api".to_string(),
            ));
        }

        let url = self.chat_completions_url();
        tracing::debug!(
            deployment = %self.deployment,
            messages = request.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .http_client
            .post(url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // An unreadable body must not hide the status.
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::debug!(error = %e, %status, "failed to read error response body");
                String::new()
            });
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str::<ChatCompletionResponse>(&body).map_err(|e| {
            Error::Protocol(format!("Malformed chat completion response ({e}): {body}"))
        })
    }
}
