use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use masa_api::{
    build_router,
    config::Config,
    notifier::TicketNotifier,
    pipeline::ChatPipeline,
    state::AppState,
};
use masa_context::DefaultContextStrategy;
use masa_llm::{ChatClient, ChatOptions, ChatRequest, ChatResponse, EmbeddingClient};
use masa_persist::{InMemoryPersistence, PersistenceClient};
use masa_search::{ProductMatch, ProductMetadata, SemanticSearch, VectorIndex, VectorRecord};
use masa_types::{FeedbackOrigin, SupportTicket};
use serde_json::{json, Value};
use tower::ServiceExt;

const REPLY: &str = "¡Sí! Tenemos pan de masa madre de centeno, fermentado durante 48 horas 🍞";

struct FakeEmbedder;

#[async_trait]
impl EmbeddingClient for FakeEmbedder {
    fn model_name(&self) -> &str {
        "fake-embed"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.1; 4]).collect())
    }
}

struct FakeIndex;

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn query(&self, _vector: Vec<f32>, _top_k: usize) -> Result<Vec<ProductMatch>> {
        let product = |id: &str, score: f32, title: &str| ProductMatch {
            id: id.to_string(),
            score,
            metadata: ProductMetadata {
                title: Some(title.to_string()),
                price_range: Some("$120.00 MXN".to_string()),
                ..Default::default()
            },
        };
        Ok(vec![
            product("product_1", 0.92, "Pan de centeno"),
            product("product_2", 0.55, "Galletas de avena"),
        ])
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize> {
        Ok(records.len())
    }

    async fn vector_count(&self) -> Result<u64> {
        Ok(2)
    }
}

/// Replies with a fixed text, or fails when `reply` is None
struct FakeChat {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatClient for FakeChat {
    fn provider_name(&self) -> &str {
        "claude"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        if let Some(first) = request.messages.first() {
            self.prompts.lock().unwrap().push(first.content().to_string());
        }
        match &self.reply {
            Some(text) => Ok(ChatResponse {
                content: Some(text.clone()),
                usage: None,
                stop_reason: Some("end_turn".to_string()),
                raw: Value::Null,
            }),
            None => anyhow::bail!("Anthropic API error (529): overloaded"),
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    tickets: Mutex<Vec<String>>,
}

#[async_trait]
impl TicketNotifier for RecordingNotifier {
    async fn notify(&self, ticket: &SupportTicket) -> Result<()> {
        self.tickets.lock().unwrap().push(ticket.ticket_id.clone());
        Ok(())
    }
}

struct TestApp {
    router: Router,
    store: Arc<InMemoryPersistence>,
    chat: Arc<FakeChat>,
    notifier: Arc<RecordingNotifier>,
}

fn app_with_reply(reply: Option<&str>) -> TestApp {
    let store = Arc::new(InMemoryPersistence::new());
    let chat = Arc::new(FakeChat {
        reply: reply.map(str::to_string),
        prompts: Mutex::new(Vec::new()),
    });
    let notifier = Arc::new(RecordingNotifier::default());

    let pipeline = ChatPipeline::new(
        SemanticSearch::new(Arc::new(FakeEmbedder), Arc::new(FakeIndex)),
        Arc::new(DefaultContextStrategy::default()),
        chat.clone(),
        store.clone(),
        "claude-sonnet-4-20250514",
        ChatOptions::new().temperature(0.3).max_tokens(512),
    );
    let state = AppState::new(Config::default(), store.clone(), pipeline, notifier.clone());

    TestApp {
        router: build_router(Arc::new(state)),
        store,
        chat,
        notifier,
    }
}

fn app() -> TestApp {
    app_with_reply(Some(REPLY))
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::POST, uri, Some(body)).await
}

async fn init(router: &Router, user_id: &str) {
    let (status, _) = post(router, "/api/chat/init", json!({ "user_id": user_id })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app.router, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "masa-madre-chatbot-api");
    assert!(body["timestamp"].is_string());
    assert!(body["services"]["storage"].as_str().unwrap().starts_with("connected"));
}

#[tokio::test]
async fn test_init_without_user_id_mints_one() {
    let app = app();
    let (status, body) = send(&app.router, Method::POST, "/api/chat/init", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Sesión de chat iniciada");
    assert!(body["welcome_message"].as_str().unwrap().starts_with("¡Hola!"));

    let user_id = body["user_id"].as_str().unwrap();
    assert!(user_id.starts_with("user_"));
    assert!(app.store.get_conversation(user_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_back_to_back_anonymous_inits_get_separate_sessions() {
    let app = app();
    let (_, first) = send(&app.router, Method::POST, "/api/chat/init", None).await;
    let (_, second) = send(&app.router, Method::POST, "/api/chat/init", None).await;
    let first = first["user_id"].as_str().unwrap().to_string();
    let second = second["user_id"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    let (status, _) = post(
        &app.router,
        "/api/chat/message",
        json!({ "user_id": first, "message": "secreto de A" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/chat/history/{}", second);
    let (status, body) = send(&app.router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["exchanges"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_message_returns_reply_and_filtered_sources() {
    let app = app();
    init(&app.router, "user_42").await;

    let (status, body) = post(
        &app.router,
        "/api/chat/message",
        json!({ "user_id": "user_42", "message": "  ¿Tienen pan de centeno?  " }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["user_id"], "user_42");
    assert_eq!(body["response"], REPLY);
    assert_eq!(body["difficulty"]["detected"], false);

    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0]["title"], "Pan de centeno");
    assert_eq!(sources[0]["availability"], "No disponible");

    // All matches reach the prompt, not only the cited ones
    let prompts = app.chat.prompts.lock().unwrap().clone();
    assert!(prompts[0].contains("Galletas de avena"));
    assert!(prompts[0].contains("**Pregunta del cliente:** ¿Tienen pan de centeno?"));

    let exchanges = app.store.get_exchanges("user_42").await.unwrap();
    assert_eq!(exchanges.len(), 1);
    assert_eq!(exchanges[0].query, "¿Tienen pan de centeno?");
}

#[tokio::test]
async fn test_message_validation_errors() {
    let app = app();
    init(&app.router, "user_1").await;

    let cases = [
        (json!({ "message": "hola" }), "user_id es requerido"),
        (json!({ "user_id": "", "message": "hola" }), "user_id es requerido"),
        (
            json!({ "user_id": "nadie", "message": "hola" }),
            "Sesión no válida. Por favor, inicia una nueva sesión.",
        ),
        (json!({ "user_id": "user_1", "message": "   " }), "El mensaje no puede estar vacío"),
        (json!({ "user_id": "user_1" }), "El mensaje no puede estar vacío"),
    ];

    for (body, expected) in cases {
        let (status, resp) = post(&app.router, "/api/chat/message", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["message"], expected);
    }
    assert!(app.store.get_exchanges("user_1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/chat/message")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Solicitud inválida");
}

#[tokio::test]
async fn test_generation_failure_is_recorded_as_system_feedback() {
    let app = app_with_reply(None);
    init(&app.router, "user_7").await;

    let (status, body) = post(
        &app.router,
        "/api/chat/message",
        json!({ "user_id": "user_7", "message": "¿Hacen envíos?" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Error al procesar tu mensaje");

    let feedback = app.store.list_feedback().await.unwrap();
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0].origin, FeedbackOrigin::System);
    assert_eq!(feedback[0].rating.value(), 1);
    assert!(feedback[0].comment.starts_with("Error técnico interno: "));
    assert_eq!(
        feedback[0].response,
        "Error interno del sistema al procesar la consulta. El equipo ha sido notificado."
    );
    assert!(app.store.get_exchanges("user_7").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_feedback_requires_an_exchange() {
    let app = app();
    init(&app.router, "user_3").await;

    let (status, body) = post(
        &app.router,
        "/api/chat/feedback",
        json!({ "user_id": "user_3", "rating": 5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No hay historial de conversación para calificar");
    assert!(app.store.list_feedback().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_feedback_rating_validation() {
    let app = app();
    init(&app.router, "user_4").await;
    post(&app.router, "/api/chat/message", json!({ "user_id": "user_4", "message": "hola" })).await;

    for rating in [json!(0), json!(6), json!(4.5), json!("5"), Value::Null] {
        let (status, body) = post(
            &app.router,
            "/api/chat/feedback",
            json!({ "user_id": "user_4", "rating": rating }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Calificación inválida. Debe ser un número entre 1 y 5.");
    }

    let (status, body) = post(
        &app.router,
        "/api/chat/feedback",
        json!({ "user_id": "ghost", "rating": 3 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Sesión no válida");
}

#[tokio::test]
async fn test_feedback_records_last_exchange_and_summary() {
    let app = app();
    init(&app.router, "user_5").await;
    post(&app.router, "/api/chat/message", json!({ "user_id": "user_5", "message": "primera" })).await;
    post(&app.router, "/api/chat/message", json!({ "user_id": "user_5", "message": "segunda" })).await;

    let (status, body) = post(
        &app.router,
        "/api/chat/feedback",
        json!({ "user_id": "user_5", "rating": 2, "comment": "No era lo que buscaba" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "¡Gracias por tu retroalimentación!");

    let feedback = app.store.list_feedback().await.unwrap();
    assert_eq!(feedback[0].query, "segunda");
    assert_eq!(feedback[0].provider, "claude");
    assert_eq!(feedback[0].origin, FeedbackOrigin::User);

    let (status, body) = send(&app.router, Method::GET, "/api/feedback/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total_feedback"], 1);
    assert_eq!(body["summary"]["low_ratings"], 1);
    assert_eq!(body["summary"]["recent_feedback"][0]["comment"], "No era lo que buscaba");
}

#[tokio::test]
async fn test_history_is_chronological() {
    let app = app();
    init(&app.router, "user_6").await;
    for message in ["uno", "dos", "tres"] {
        let (status, _) = post(
            &app.router,
            "/api/chat/message",
            json!({ "user_id": "user_6", "message": message }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app.router, Method::GET, "/api/chat/history/user_6", None).await;
    assert_eq!(status, StatusCode::OK);
    let queries: Vec<&str> = body["exchanges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["query"].as_str().unwrap())
        .collect();
    assert_eq!(queries, vec!["uno", "dos", "tres"]);

    let (status, body) = send(&app.router, Method::GET, "/api/chat/history/ghost", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Sesión no válida");
}

#[tokio::test]
async fn test_reinit_keeps_existing_history() {
    let app = app();
    init(&app.router, "user_8").await;
    post(&app.router, "/api/chat/message", json!({ "user_id": "user_8", "message": "hola" })).await;
    init(&app.router, "user_8").await;

    assert_eq!(app.store.get_exchanges("user_8").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_support_ticket_flow() {
    let app = app();
    init(&app.router, "user_9").await;

    let (status, body) = post(
        &app.router,
        "/api/chat/support",
        json!({ "user_id": "user_9", "contact_info": "ana@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No hay historial de conversación");

    post(
        &app.router,
        "/api/chat/message",
        json!({ "user_id": "user_9", "message": "quiero hablar con alguien" }),
    )
    .await;

    let (status, body) = post(&app.router, "/api/chat/support", json!({ "user_id": "user_9" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Se requiere información de contacto");

    let (status, body) = post(
        &app.router,
        "/api/chat/support",
        json!({ "user_id": "user_9", "contact_info": { "name": "Ana", "email": "ana@", "phone": "81 1234 5678" } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Información de contacto inválida: "));

    let (status, body) = post(
        &app.router,
        "/api/chat/support",
        json!({ "user_id": "user_9", "contact_info": { "name": "Ana López", "email": "ana@example.com", "phone": "(81) 1234-5678" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Ticket de soporte creado. Un representante se contactará contigo pronto."
    );

    let ticket_id = body["ticket_id"].as_str().unwrap();
    assert!(ticket_id.starts_with("TICKET-"));
    let ticket = app.store.get_ticket(ticket_id).await.unwrap().unwrap();
    assert_eq!(ticket.query, "quiero hablar con alguien");
    assert_eq!(ticket.reason, "Solicitud de soporte humano desde el widget de chat");
    assert_eq!(*app.notifier.tickets.lock().unwrap(), vec![ticket_id.to_string()]);
}

#[tokio::test]
async fn test_cors_preflight_for_storefront() {
    let app = app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/chat/message")
        .header(header::ORIGIN, "https://masamadremonterrey.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://masamadremonterrey.com"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "3600");
}
