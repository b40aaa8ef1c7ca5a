use async_trait::async_trait;
use parla_core::turn::StructuredTurn;
use parla_core::wire::{ChatRequest, ErrorResponse, SpeechRequest, SpeechResponse};
use parla_engine::retry::{RetryPolicy, with_retry};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default client-side timeout on one backend call. Free-tier backends may
/// need to wake up, so this sits well above a normal round-trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Failures a backend call can surface to the UI, kept distinguishable so
/// each gets its own affordance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("the tutor is taking too long to answer; the server might be waking up or busy")]
    Timeout,
    #[error("could not reach the server: {0}")]
    Network(String),
    #[error("{0}")]
    Server(String),
}

#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn chat(&self, req: &ChatRequest) -> Result<StructuredTurn, ClientError>;
    async fn speech(&self, req: &SpeechRequest) -> Result<SpeechResponse, ClientError>;
}

pub struct HttpBackendClient {
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    http: reqwest::Client,
}

impl HttpBackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(250),
                backoff_factor: 2,
            },
            http: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_json<Req, Resp>(&self, path: &str, req: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let call = async {
            let resp = self
                .http
                .post(self.url(path))
                .json(req)
                .send()
                .await
                .map_err(|e| ClientError::Network(e.to_string()))?;

            let status = resp.status();
            let body = resp
                .bytes()
                .await
                .map_err(|e| ClientError::Network(e.to_string()))?;

            if !status.is_success() {
                let message = serde_json::from_slice::<ErrorResponse>(&body)
                    .map(|e| e.error)
                    .unwrap_or_else(|_| format!("server error (status {})", status.as_u16()));
                return Err(ClientError::Server(message));
            }

            serde_json::from_slice(&body)
                .map_err(|e| ClientError::Server(format!("unexpected response shape: {e}")))
        };

        // The timeout aborts the HTTP exchange; it cannot cancel vendor work
        // already in flight server-side.
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        }
    }

    /// Network-class failures are worth one backoff retry; timeouts and
    /// server-reported errors are not.
    async fn post_json_with_retry<Req, Resp>(
        &self,
        path: &str,
        req: &Req,
    ) -> Result<Resp, ClientError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        with_retry(
            self.retry,
            |e: &ClientError| matches!(e, ClientError::Network(_)),
            || self.post_json(path, req),
        )
        .await
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn chat(&self, req: &ChatRequest) -> Result<StructuredTurn, ClientError> {
        self.post_json_with_retry("/api/chat", req).await
    }

    async fn speech(&self, req: &SpeechRequest) -> Result<SpeechResponse, ClientError> {
        self.post_json_with_retry("/api/speech", req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parla_core::wire::SpeechFormat;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_request() -> ChatRequest {
        ChatRequest {
            message: Some("Bonjour".into()),
            audio_data: None,
            audio_mime_type: None,
            session_id: "s1".into(),
            language: "French".into(),
            scenario: None,
        }
    }

    #[tokio::test]
    async fn chat_decodes_a_structured_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"correction":{"hasMistake":false},"response":{"targetText":"Salut !","english":"Hi!","chinese":"你好！"}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = HttpBackendClient::new(server.uri());
        let turn = client.chat(&chat_request()).await.unwrap();
        assert_eq!(turn.response.target_text, "Salut !");
    }

    #[tokio::test]
    async fn server_error_payload_is_surfaced_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_raw(r#"{"error":"unsupported language: Klingon"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let client = HttpBackendClient::new(server.uri());
        let err = client.chat(&chat_request()).await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Server("unsupported language: Klingon".into())
        );
    }

    #[tokio::test]
    async fn slow_responses_become_a_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{}", "application/json")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            HttpBackendClient::new(server.uri()).with_timeout(Duration::from_millis(50));
        let err = client.chat(&chat_request()).await.unwrap_err();
        assert_eq!(err, ClientError::Timeout);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        // Nothing listens on this port.
        let client = HttpBackendClient::new("http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2))
            .with_retry(RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_millis(1),
                backoff_factor: 2,
            });
        let err = client.chat(&chat_request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[tokio::test]
    async fn speech_round_trips_format_tag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"audioData":"AAAA","format":"pcm"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = HttpBackendClient::new(server.uri());
        let resp = client
            .speech(&SpeechRequest {
                text: "Salut".into(),
                voice_name: "Kore".into(),
            })
            .await
            .unwrap();
        assert_eq!(resp.format, SpeechFormat::Pcm);
        assert_eq!(resp.audio_data, "AAAA");
    }
}
