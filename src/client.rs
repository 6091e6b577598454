use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;

use crate::accumulating_stream::{Reply, drain};
use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::render::Renderer;
use crate::interrupt::interruptible;
use crate::sse::{SseEvent, process_sse_with_read_timeout};
use crate::types::{ChatCompletion, ChatCompletionRequest};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Limit on connecting, on waiting for headers, and on any single body read.
///
/// A long reply that keeps sending data is never cut off.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Something that can carry one chat completion request and bring back the reply.
///
/// [`ChatClient`] is the HTTP implementation; sessions are generic over this so
/// that they can be driven without a network.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// The endpoint requests are sent to, for display.
    fn base_url(&self) -> &str;

    /// Send `request` and return the assembled reply.
    ///
    /// When `request.stream` is set, every fragment is handed to `renderer` as it
    /// arrives; otherwise the renderer is not touched.
    async fn send(
        &self,
        request: &ChatCompletionRequest,
        renderer: &mut dyn Renderer,
    ) -> Result<Reply>;
}

/// Client for OpenAI-compatible Chat Completions endpoints.
#[derive(Clone)]
pub struct ChatClient {
    api_key: Option<String>,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "****"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl ChatClient {
    /// Create a new client for `base_url`.
    ///
    /// An empty or absent API key sends no `Authorization` header, which is what
    /// key-less local servers expect.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, Some(base_url.into()), None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.filter(|key| !key.is_empty());
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;
        let base_url = base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request and response.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The endpoint requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The idle timeout applied to connecting and to each wait on the server.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns true if requests carry a bearer token.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self, accept: &'static str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static(accept));
        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
                Error::validation(
                    "API key contains characters not allowed in a header",
                    Some("api_key".to_string()),
                )
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn idle_timeout(&self, waiting_for: &str) -> Error {
        Error::timeout(
            &self.base_url,
            format!(
                "no answer for {:.1} seconds while {waiting_for}",
                self.timeout.as_secs_f64()
            ),
            Some(self.timeout),
        )
    }

    /// Map a failure to get a response at all into the connectivity class.
    fn classify_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                &self.base_url,
                format!("Request timed out: {e}"),
                Some(self.timeout),
            )
        } else if e.is_builder() {
            Error::http_client(format!("Invalid request: {e}"), Some(Box::new(e)))
        } else {
            Error::connection(&self.base_url, e.to_string(), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
        let message = detail
            .and_then(|e| e.message)
            .unwrap_or_else(|| error_body.trim().to_string());

        Error::api(status_code, error_type, message)
    }

    async fn post(&self, request: &ChatCompletionRequest, accept: &'static str) -> Result<Response> {
        CLIENT_REQUESTS.click();
        if let Some(logger) = &self.logger {
            logger.log_request(request);
        }

        let pending = self
            .client
            .post(self.completions_url())
            .headers(self.default_headers(accept)?)
            .json(request)
            .send();
        let response = tokio::time::timeout(self.timeout, pending)
            .await
            .map_err(|_| self.idle_timeout("waiting for response headers"))?
            .map_err(|e| self.classify_send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    /// Send a request and wait for the complete, non-streamed reply.
    ///
    /// `request.stream` is forced off.
    pub async fn complete(&self, request: &ChatCompletionRequest) -> Result<Reply> {
        let mut request = request.clone();
        request.stream = false;

        let response = self.post(&request, "application/json").await?;
        let body = tokio::time::timeout(self.timeout, response.text())
            .await
            .map_err(|_| self.idle_timeout("reading the response body"))?
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        &self.base_url,
                        format!("Timed out reading response: {e}"),
                        Some(self.timeout),
                    )
                } else {
                    Error::streaming(format!("Failed to read response: {e}"), Some(Box::new(e)))
                }
            })?;
        let completion = serde_json::from_str::<ChatCompletion>(&body).map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })?;
        let message = completion.into_message()?;

        if let Some(logger) = &self.logger {
            logger.log_response(&message);
        }
        Ok(Reply::complete(message))
    }

    /// Send a request and get the decoded server-sent events.
    ///
    /// `request.stream` is forced on.  The returned stream ends after the
    /// `[DONE]` sentinel or when the server closes the body.
    pub async fn stream_events(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<impl Stream<Item = Result<SseEvent>> + Send + use<>> {
        let mut request = request.clone();
        request.stream = true;

        let response = self.post(&request, "text/event-stream").await?;
        Ok(process_sse_with_read_timeout(
            response.bytes_stream(),
            self.base_url.clone(),
            self.timeout,
        ))
    }

    /// Send a request and stream the reply into `renderer`.
    pub async fn stream(
        &self,
        request: &ChatCompletionRequest,
        renderer: &mut dyn Renderer,
    ) -> Result<Reply> {
        // The header wait is raced here; drain races each read itself.
        let interrupt = renderer.interrupt();
        let events = match interruptible(self.stream_events(request), interrupt.as_ref()).await {
            Ok(events) => events,
            Err(err) => {
                if err.is_abort() {
                    renderer.print_interrupted();
                }
                return Err(err);
            }
        };
        drain(events, renderer, self.logger.as_deref()).await
    }
}

#[async_trait::async_trait]
impl Transport for ChatClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        request: &ChatCompletionRequest,
        renderer: &mut dyn Renderer,
    ) -> Result<Reply> {
        let started = Instant::now();
        let result = if request.stream {
            self.stream(request, renderer).await
        } else {
            let interrupt = renderer.interrupt();
            let result = interruptible(self.complete(request), interrupt.as_ref()).await;
            if result.as_ref().is_err_and(Error::is_abort) {
                renderer.print_interrupted();
            }
            result
        };
        CLIENT_REQUEST_DURATION.add(started.elapsed().as_secs_f64());
        if result.is_err() {
            CLIENT_REQUEST_ERRORS.click();
        }
        result
    }
}
