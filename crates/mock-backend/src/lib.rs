//! # Mock backend
//!
//! An in-process implementation of the Scholia backend contract. The SDK
//! and session crates test against it over real HTTP; the binary serves it
//! for local development.
//!
//! | Route                 | Auth   | Behaviour                                   |
//! |-----------------------|--------|---------------------------------------------|
//! | `POST /auth/register` | –      | create an account                           |
//! | `POST /auth/login`    | –      | `{access_token, user}`                      |
//! | `GET /profile`        | bearer | user record with its background `profile`   |
//! | `POST /profile/quiz`  | bearer | store quiz answers as the profile           |
//! | `POST /chat`          | bearer | streamed `text/plain` reply ([`ChatScript`]) |
//! | `POST /personalize`   | bearer | [`TransformReply`], 404 without a profile   |
//! | `POST /translate`     | bearer | [`TransformReply`]                          |

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

pub use config::BackendConfig;
pub use error::BackendError;
pub use state::{ChatScript, MockBackend, TransformReply};

/// Build the router over `backend`.
pub fn router(backend: MockBackend) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/profile", get(handlers::profile))
        .route("/profile/quiz", post(handlers::submit_quiz))
        .route("/chat", post(handlers::chat))
        .route("/personalize", post(handlers::personalize))
        .route("/translate", post(handlers::translate))
        .with_state(backend)
}

/// Serve `backend` on an ephemeral loopback port in a background task.
///
/// Returns the base URL, e.g. `http://127.0.0.1:49152`.
pub async fn serve_ephemeral(backend: MockBackend) -> std::io::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(backend);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "mock backend stopped");
        }
    });
    Ok(format!("http://{addr}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn server(backend: &MockBackend) -> TestServer {
        TestServer::new(router(backend.clone())).unwrap()
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn register_then_login() {
        let backend = MockBackend::new();
        let server = server(&backend);

        let res = server
            .post("/auth/register")
            .json(&json!({ "email": "a1@example.com", "password": "pw" }))
            .await;
        res.assert_status(StatusCode::CREATED);

        let res = server
            .post("/auth/login")
            .json(&json!({ "email": "a1@example.com", "password": "pw" }))
            .await;
        res.assert_status_ok();
        let body: Value = res.json();
        assert!(body["access_token"].as_str().unwrap().starts_with("tok-"));
        assert_eq!(body["user"]["email"], "a1@example.com");
        assert_eq!(body["user"]["id"], 1);
    }

    #[tokio::test]
    async fn duplicate_register_is_bad_request() {
        let backend = MockBackend::new();
        backend.register("a1@example.com", "pw", None);
        let res = server(&backend)
            .post("/auth/register")
            .json(&json!({ "email": "a1@example.com", "password": "pw" }))
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        res.assert_json(&json!({ "detail": "Email already registered" }));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let backend = MockBackend::new();
        backend.register("a1@example.com", "pw", None);
        let res = server(&backend)
            .post("/auth/login")
            .json(&json!({ "email": "a1@example.com", "password": "nope" }))
            .await;
        res.assert_status_unauthorized();
        res.assert_json(&json!({ "detail": "Incorrect email or password" }));
    }

    // ------------------------------------------------------------------
    // Profile and quiz
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn profile_requires_bearer() {
        let backend = MockBackend::new();
        server(&backend).get("/profile").await.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn quiz_populates_profile() {
        let backend = MockBackend::new();
        let (token, who) = backend.session_for("a1@example.com", Some("A1"));
        let server = server(&backend);

        let before: Value = server.get("/profile").authorization_bearer(&token).await.json();
        assert!(before["profile"].is_null());

        let res = server
            .post("/profile/quiz")
            .authorization_bearer(&token)
            .json(&json!({
                "user_id": who.id,
                "python_experience": 3,
                "ros_experience": 1,
                "has_gpu": true,
                "has_jetson": false,
                "has_robot_access": false,
            }))
            .await;
        res.assert_status_ok();
        assert_eq!(res.json::<Value>()["message"], "Quiz answers saved.");

        let after: Value = server.get("/profile").authorization_bearer(&token).await.json();
        assert_eq!(after["profile"]["python_experience"], 3);
    }

    #[tokio::test]
    async fn out_of_range_quiz_is_unprocessable() {
        let backend = MockBackend::new();
        let (token, who) = backend.session_for("a1@example.com", None);
        let res = server(&backend)
            .post("/profile/quiz")
            .authorization_bearer(&token)
            .json(&json!({
                "user_id": who.id,
                "python_experience": 9,
                "ros_experience": 1,
                "has_gpu": false,
                "has_jetson": false,
                "has_robot_access": false,
            }))
            .await;
        res.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = res.json();
        assert!(body["detail"][0]["msg"].as_str().unwrap().contains("python_experience"));
    }

    // ------------------------------------------------------------------
    // Chat
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn chat_echoes_selection() {
        let backend = MockBackend::new();
        let (token, _) = backend.session_for("a1@example.com", None);
        let res = server(&backend)
            .post("/chat")
            .authorization_bearer(&token)
            .json(&json!({ "message": "why?", "selected_text": "PID", "chapter_id": "ch-3" }))
            .await;
        res.assert_status_ok();
        res.assert_text("Chat response based on selected text: 'PID' and message: 'why?'");

        let recorded = backend.chat_requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].chapter_id.as_ref().unwrap().as_str(), "ch-3");
    }

    #[tokio::test]
    async fn chat_without_token_is_not_recorded() {
        let backend = MockBackend::new();
        server(&backend)
            .post("/chat")
            .json(&json!({ "message": "hi" }))
            .await
            .assert_status_unauthorized();
        assert!(backend.chat_requests().is_empty());
    }

    #[tokio::test]
    async fn scripted_chunks_are_concatenated() {
        let backend = MockBackend::new();
        let (token, _) = backend.session_for("a1@example.com", None);
        backend.script_chat(ChatScript::Chunks(vec!["Hel".into(), "lo".into()]));
        server(&backend)
            .post("/chat")
            .authorization_bearer(&token)
            .json(&json!({ "message": "hi" }))
            .await
            .assert_text("Hello");
    }

    #[tokio::test]
    async fn scripted_chat_rejection_is_verbatim() {
        let backend = MockBackend::new();
        let (token, _) = backend.session_for("a1@example.com", None);
        backend.script_chat(ChatScript::Reject {
            status: 500,
            body: r#"{"detail":"model offline"}"#.into(),
        });
        let res = server(&backend)
            .post("/chat")
            .authorization_bearer(&token)
            .json(&json!({ "message": "hi" }))
            .await;
        res.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        res.assert_text(r#"{"detail":"model offline"}"#);
    }

    // ------------------------------------------------------------------
    // Personalize / translate
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn personalize_without_profile_is_not_found() {
        let backend = MockBackend::new();
        let (token, who) = backend.session_for("a1@example.com", None);
        let res = server(&backend)
            .post("/personalize")
            .authorization_bearer(&token)
            .json(&json!({
                "chapter_path": "ch-1",
                "chapter_original_text": "Nodes talk over topics.",
                "user_id": who.id,
            }))
            .await;
        res.assert_status_not_found();
        res.assert_json(&json!({ "detail": "User profile not found." }));
    }

    #[tokio::test]
    async fn personalize_addresses_the_reader() {
        let backend = MockBackend::new();
        let (token, who) = backend.session_for("a1@example.com", Some("Ada"));
        backend.set_profile(who.id, json!({ "ros_experience": 1 }));
        let res = server(&backend)
            .post("/personalize")
            .authorization_bearer(&token)
            .json(&json!({
                "chapter_path": "ch-1",
                "chapter_original_text": "Nodes talk over topics.",
                "user_id": who.id,
            }))
            .await;
        res.assert_status_ok();
        res.assert_json(&json!({ "personalized_chapter_text": "Hi Ada. Nodes talk over topics." }));
    }

    #[tokio::test]
    async fn translate_tags_target_language() {
        let backend = MockBackend::new();
        let (token, _) = backend.session_for("a1@example.com", None);
        let res = server(&backend)
            .post("/translate")
            .authorization_bearer(&token)
            .json(&json!({ "text": "Hello", "target_language": "ur" }))
            .await;
        res.assert_json(&json!({ "translated_text": "[ur] Hello" }));
        assert_eq!(backend.translate_requests()[0].target_language.as_str(), "ur");
    }

    #[tokio::test]
    async fn gated_translation_waits_for_release() {
        let backend = MockBackend::new();
        let (token, _) = backend.session_for("a1@example.com", None);
        let gate = Arc::new(Notify::new());
        backend.script_translate(TransformReply::Gated {
            text: "done".into(),
            gate: gate.clone(),
        });
        let server = server(&backend);

        let request = server
            .post("/translate")
            .authorization_bearer(&token)
            .json(&json!({ "text": "x", "target_language": "ur" }));
        gate.notify_one();
        request.await.assert_json(&json!({ "translated_text": "done" }));
    }

    #[tokio::test]
    async fn serve_ephemeral_reports_loopback_url() {
        let url = serve_ephemeral(MockBackend::new()).await.unwrap();
        assert!(url.starts_with("http://127.0.0.1:"));
    }
}
