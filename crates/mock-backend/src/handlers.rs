//! Axum handlers implementing the backend contract.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Json, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use scholia_models::{
    ChatRequest, Identity, PersonalizeRequest, PersonalizeResponse, QuizAnswers, QuizReceipt,
    SignInRequest, TranslateRequest, TranslateResponse,
};
use serde_json::{json, Value};
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::error::BackendError;
use crate::state::{ChatScript, MockBackend, TransformReply};

/// Pause between streamed chunks so each one is flushed on its own.
const CHUNK_INTERVAL: Duration = Duration::from_millis(5);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(backend: &MockBackend, headers: &HeaderMap) -> Result<Identity, BackendError> {
    bearer_token(headers)
        .and_then(|token| backend.identity_for_token(token))
        .ok_or(BackendError::Unauthorized)
}

/// The canned reply of [`ChatScript::Echo`].
pub fn echo_reply(req: &ChatRequest) -> String {
    match &req.selected_text {
        Some(selected) => format!(
            "Chat response based on selected text: '{selected}' and message: '{}'",
            req.message
        ),
        None => format!("Chat response based on message: '{}'", req.message),
    }
}

/// Stream `chunks` as a `text/plain` body.
///
/// With a `gate`, the body pauses after the first chunk until the gate is
/// notified. With `abort`, the body ends in an error instead of a clean
/// end-of-stream, which drops the connection mid-body.
fn stream_chunks(chunks: Vec<String>, gate: Option<Arc<Notify>>, abort: bool) -> Response {
    let (tx, rx) = futures::channel::mpsc::unbounded::<Result<String, std::io::Error>>();

    tokio::spawn(async move {
        for (i, chunk) in chunks.into_iter().enumerate() {
            if tx.unbounded_send(Ok(chunk)).is_err() {
                return;
            }
            match (&gate, i) {
                (Some(gate), 0) => gate.notified().await,
                _ => tokio::time::sleep(CHUNK_INTERVAL).await,
            }
        }
        if abort {
            let _ = tx.unbounded_send(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "stream aborted by script",
            )));
        }
    });

    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(rx),
    )
        .into_response()
}

async fn resolve_transform(
    reply: TransformReply,
    derived: impl FnOnce() -> Result<String, BackendError>,
) -> Result<String, BackendError> {
    match reply {
        TransformReply::Derived => derived(),
        TransformReply::Text(text) => Ok(text),
        TransformReply::Reject { status, body } => Err(BackendError::Scripted { status, body }),
        TransformReply::Gated { text, gate } => {
            gate.notified().await;
            Ok(text)
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /`: liveness probe.
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Scholia mock backend" }))
}

/// `POST /auth/register`
pub async fn register(
    State(backend): State<MockBackend>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, BackendError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(BackendError::Invalid("email and password are required".into()));
    }
    let identity = backend
        .register(req.email.trim(), &req.password, None)
        .ok_or(BackendError::DuplicateAccount)?;
    info!(user = %identity.id, "account registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "user": identity })),
    ))
}

/// `POST /auth/login`
pub async fn login(
    State(backend): State<MockBackend>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<Value>, BackendError> {
    let (token, identity) = backend
        .sign_in(req.email.trim(), &req.password)
        .ok_or(BackendError::BadCredentials)?;
    info!(user = %identity.id, "signed in");
    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": identity,
    })))
}

/// `GET /profile`
pub async fn profile(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
) -> Result<Json<Value>, BackendError> {
    let identity = authenticate(&backend, &headers)?;
    Ok(Json(json!({
        "id": identity.id,
        "email": identity.email,
        "name": identity.name,
        "profile": backend.profile(identity.id),
    })))
}

/// `POST /profile/quiz`
pub async fn submit_quiz(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(answers): Json<QuizAnswers>,
) -> Result<Json<QuizReceipt>, BackendError> {
    let identity = authenticate(&backend, &headers)?;
    if answers.user_id != identity.id {
        return Err(BackendError::Invalid(
            "user_id does not match the signed-in user".into(),
        ));
    }
    answers
        .validate()
        .map_err(|e| BackendError::Invalid(e.to_string()))?;

    let profile_id = backend.store_quiz(&answers);
    info!(user = %identity.id, profile_id, "quiz answers stored");
    Ok(Json(QuizReceipt {
        status: "success".into(),
        message: "Quiz answers saved.".into(),
        profile_id,
    }))
}

/// `POST /chat`: streamed plain-text reply.
pub async fn chat(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Response, BackendError> {
    let identity = authenticate(&backend, &headers)?;
    debug!(user = %identity.id, with_selection = req.selected_text.is_some(), "chat request");
    backend.record_chat(req.clone());

    let response = match backend.chat_script() {
        ChatScript::Echo => {
            let reply = echo_reply(&req);
            let chunks = reply.split_inclusive(' ').map(String::from).collect();
            stream_chunks(chunks, None, false)
        }
        ChatScript::Chunks(chunks) => stream_chunks(chunks, None, false),
        ChatScript::Interrupt(chunks) => stream_chunks(chunks, None, true),
        ChatScript::Gated { chunks, gate } => stream_chunks(chunks, Some(gate), false),
        ChatScript::Reject { status, body } => {
            return Err(BackendError::Scripted { status, body });
        }
    };
    Ok(response)
}

/// `POST /personalize`
pub async fn personalize(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(req): Json<PersonalizeRequest>,
) -> Result<Json<PersonalizeResponse>, BackendError> {
    let identity = authenticate(&backend, &headers)?;
    backend.record_personalize(req.clone());

    let has_profile = !backend.profile(identity.id).is_null();
    let text = resolve_transform(backend.personalize_reply(), || {
        if !has_profile {
            return Err(BackendError::ProfileNotFound);
        }
        Ok(format!(
            "Hi {}. {}",
            identity.display_name(),
            req.chapter_original_text
        ))
    })
    .await?;

    info!(user = %identity.id, chapter = %req.chapter_path, "chapter personalized");
    Ok(Json(PersonalizeResponse {
        personalized_chapter_text: text,
    }))
}

/// `POST /translate`
pub async fn translate(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, BackendError> {
    let identity = authenticate(&backend, &headers)?;
    backend.record_translate(req.clone());

    let text = resolve_transform(backend.translate_reply(), || {
        Ok(format!("[{}] {}", req.target_language, req.text))
    })
    .await?;

    info!(user = %identity.id, language = %req.target_language, "text translated");
    Ok(Json(TranslateResponse {
        translated_text: text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use scholia_models::{DocumentId, SelectionContext};

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-1"));
        assert_eq!(bearer_token(&headers), Some("tok-1"));
    }

    #[test]
    fn echo_reply_mentions_selection() {
        let ctx = SelectionContext::capture("torque control", DocumentId::new("ch-2"));
        let reply = echo_reply(&ChatRequest::new("explain this", &ctx));
        assert_eq!(
            reply,
            "Chat response based on selected text: 'torque control' and message: 'explain this'"
        );
        let plain = echo_reply(&ChatRequest::new("hi", &SelectionContext::empty()));
        assert_eq!(plain, "Chat response based on message: 'hi'");
    }
}
