use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tower_http::cors::{Any, CorsLayer};

use parla_core::turn::{AudioAttachment, TurnInput};
use parla_core::types::SessionId;
use parla_core::wire::{ChatRequest, ChatResponse, ErrorResponse, SpeechRequest, SpeechResponse};
use parla_engine::engine::{TurnError, TurnRequest, TutorEngine};

/// Shared state for the HTTP surface: just the orchestrator.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TutorEngine>,
}

/// Handler-level error carrying the HTTP status and the safe message for the
/// `{error}` body.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<TurnError> for ApiError {
    fn from(e: TurnError) -> Self {
        let status = match &e {
            TurnError::InvalidLanguage(_)
            | TurnError::InvalidScenario(_)
            | TurnError::EmptyInput => StatusCode::BAD_REQUEST,
            TurnError::Decode(_) => StatusCode::BAD_GATEWAY,
            TurnError::Vendor(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Builds the router implementing the client ⇄ backend wire contract, with
/// permissive CORS for the browser client.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat", post(handle_chat))
        .route("/speech", post(handle_speech))
        .route("/health", get(handle_health));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(Arc::new(state))
}

async fn handle_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let audio = match &req.audio_data {
        Some(b64) => {
            let data = BASE64
                .decode(b64.as_bytes())
                .map_err(|_| ApiError::bad_request("audioData is not valid base64"))?;
            Some(AudioAttachment {
                mime_type: req
                    .audio_mime_type
                    .clone()
                    .unwrap_or_else(|| "audio/pcm;rate=16000".into()),
                data,
            })
        }
        None => None,
    };

    log::info!(
        "chat: session={} language={} scenario={:?} text={} audio={}",
        req.session_id,
        req.language,
        req.scenario,
        req.message.is_some(),
        audio.is_some(),
    );

    let reply = state
        .engine
        .run_turn(TurnRequest {
            session_id: SessionId::new(req.session_id.clone()),
            language: req.language.clone(),
            scenario: req.scenario.clone(),
            input: TurnInput {
                text: req.message.clone(),
                audio,
            },
        })
        .await
        .map_err(|e| {
            log::warn!("chat turn failed for session {}: {e}", req.session_id);
            ApiError::from(e)
        })?;

    Ok(Json(reply))
}

async fn handle_speech(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeechRequest>,
) -> Result<Json<SpeechResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::bad_request("text must not be empty"));
    }

    let audio = state
        .engine
        .speak(&req.text, &req.voice_name)
        .await
        .map_err(|e| {
            log::warn!("speech synthesis failed: {e}");
            ApiError::from(e)
        })?;

    Ok(Json(SpeechResponse {
        audio_data: BASE64.encode(&audio.data),
        format: audio.format,
    }))
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use parla_core::session::HistoryCaps;
    use parla_core::turn::StructuredTurn;
    use parla_core::wire::SpeechFormat;
    use parla_engine::engine::EngineConfig;
    use parla_engine::retry::RetryPolicy;
    use parla_engine::store::InMemorySessionStore;
    use parla_engine::traits::{
        ContentPart, GenerationProvider, HistoryMessage, ProviderError, SpeechAudio,
        SpeechProvider,
    };
    use std::time::Duration;
    use tower::util::ServiceExt;

    const GOOD_REPLY: &str = "{\"correction\":{\"hasMistake\":false},\"response\":{\"targetText\":\"Bonjour !\",\"english\":\"Hello!\",\"chinese\":\"你好！\"}}";

    struct FixedGenerator {
        reply: String,
    }

    #[async_trait]
    impl GenerationProvider for FixedGenerator {
        async fn generate(
            &self,
            _system_instruction: &str,
            _history: &[HistoryMessage],
            _parts: &[ContentPart],
        ) -> Result<String, ProviderError> {
            Ok(self.reply.clone())
        }
    }

    struct FixedSpeech;

    #[async_trait]
    impl SpeechProvider for FixedSpeech {
        async fn synthesize(
            &self,
            _text: &str,
            _voice: &str,
        ) -> Result<SpeechAudio, ProviderError> {
            Ok(SpeechAudio {
                format: SpeechFormat::Pcm,
                data: vec![0u8; 8],
            })
        }
    }

    fn router_with_reply(reply: &str) -> Router {
        let engine = TutorEngine::new(
            EngineConfig {
                retry: RetryPolicy {
                    max_attempts: 1,
                    base_delay: Duration::from_millis(1),
                    backoff_factor: 2,
                },
            },
            Arc::new(InMemorySessionStore::new(HistoryCaps::default(), true)),
            Arc::new(FixedGenerator {
                reply: reply.to_string(),
            }),
            Arc::new(FixedSpeech),
        );
        create_router(AppState {
            engine: Arc::new(engine),
        })
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_the_structured_turn() {
        let router = router_with_reply(GOOD_REPLY);

        let response = router
            .oneshot(post_json(
                "/api/chat",
                serde_json::json!({
                    "message": "Bonjour",
                    "sessionId": "s1",
                    "language": "French"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let turn: StructuredTurn = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(turn.response.target_text, "Bonjour !");
    }

    #[tokio::test]
    async fn unknown_language_maps_to_400_with_error_body() {
        let router = router_with_reply(GOOD_REPLY);

        let response = router
            .oneshot(post_json(
                "/api/chat",
                serde_json::json!({
                    "message": "hi",
                    "sessionId": "s1",
                    "language": "Klingon"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Klingon"));
    }

    #[tokio::test]
    async fn empty_message_maps_to_400() {
        let router = router_with_reply(GOOD_REPLY);

        let response = router
            .oneshot(post_json(
                "/api/chat",
                serde_json::json!({
                    "sessionId": "s1",
                    "language": "French"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_audio_base64_maps_to_400() {
        let router = router_with_reply(GOOD_REPLY);

        let response = router
            .oneshot(post_json(
                "/api/chat",
                serde_json::json!({
                    "audioData": "not base64!!!",
                    "audioMimeType": "audio/pcm;rate=16000",
                    "sessionId": "s1",
                    "language": "French"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("base64"));
    }

    #[tokio::test]
    async fn undecodable_vendor_output_maps_to_502() {
        let router = router_with_reply("not json at all");

        let response = router
            .oneshot(post_json(
                "/api/chat",
                serde_json::json!({
                    "message": "Bonjour",
                    "sessionId": "s1",
                    "language": "French"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("tutor had trouble"));
    }

    #[tokio::test]
    async fn speech_returns_base64_payload_with_format_tag() {
        let router = router_with_reply(GOOD_REPLY);

        let response = router
            .oneshot(post_json(
                "/api/speech",
                serde_json::json!({ "text": "Bonjour", "voiceName": "Kore" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["format"], "pcm");
        assert_eq!(
            BASE64.decode(body["audioData"].as_str().unwrap()).unwrap(),
            vec![0u8; 8]
        );
    }

    #[tokio::test]
    async fn speech_rejects_empty_text() {
        let router = router_with_reply(GOOD_REPLY);

        let response = router
            .oneshot(post_json(
                "/api/speech",
                serde_json::json!({ "text": "  ", "voiceName": "Kore" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_endpoint_answers() {
        let router = router_with_reply(GOOD_REPLY);

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }
}
