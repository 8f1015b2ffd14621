//! Typed HTTP client for the Scholia backend.
//!
//! [`ScholiaClient`] is stateless apart from its connection pool: every
//! gated call takes the bearer token explicitly, so the caller's
//! credential store stays the single source of truth.
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use scholia_models::{DocumentId, TargetLanguage, TranslateRequest};
//! use scholia_sdk::ScholiaClient;
//!
//! # async fn run() -> Result<(), scholia_sdk::SdkError> {
//! let client = ScholiaClient::new("http://127.0.0.1:8000")?;
//! let session = client.sign_in("a1@example.com", "secret").await?;
//!
//! let request = TranslateRequest {
//!     text: "A node is a process.".into(),
//!     target_language: TargetLanguage::default(),
//! };
//! let urdu = client.translate(&session.access_token, &request).await?;
//! println!("{urdu}");
//! # Ok(())
//! # }
//! ```

use reqwest::{RequestBuilder, Response};
use scholia_models::{
    ChatRequest, ErrorDetail, PersonalizeRequest, PersonalizeResponse, QuizAnswers, QuizReceipt,
    SignInRequest, SignInResponse, TranslateRequest, TranslateResponse, UserRecord,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::SdkError;
use crate::routes::ApiRoutes;
use crate::stream::TextStream;

/// Client for one backend deployment.
#[derive(Debug, Clone)]
pub struct ScholiaClient {
    http: reqwest::Client,
    routes: ApiRoutes,
}

impl ScholiaClient {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a client rooted at `base_url`.
    ///
    /// Only `http://` and `https://` URLs are accepted.
    pub fn new(base_url: &str) -> Result<Self, SdkError> {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Create a client that reuses an existing connection pool.
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Result<Self, SdkError> {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SdkError::Config(format!(
                "backend URL must start with http:// or https://, got `{base_url}`"
            )));
        }
        Ok(Self {
            http,
            routes: ApiRoutes::new(base_url),
        })
    }

    /// The route table.
    pub fn routes(&self) -> &ApiRoutes {
        &self.routes
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Exchange e-mail and password for a bearer token and identity.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResponse, SdkError> {
        let body = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res = send(self.http.post(self.routes.login()).json(&body)).await?;
        decode(res).await
    }

    /// Create an account. The caller signs in separately afterwards.
    pub async fn register(&self, email: &str, password: &str) -> Result<(), SdkError> {
        let body = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        send(self.http.post(self.routes.register()).json(&body)).await?;
        Ok(())
    }

    /// Fetch the signed-in user's record, including the background profile.
    pub async fn fetch_profile(&self, token: &str) -> Result<UserRecord, SdkError> {
        let req = authorized(self.http.get(self.routes.profile()), token)?;
        decode(send(req).await?).await
    }

    /// Store background quiz answers.
    pub async fn submit_quiz(
        &self,
        token: &str,
        answers: &QuizAnswers,
    ) -> Result<QuizReceipt, SdkError> {
        let req = authorized(self.http.post(self.routes.quiz()), token)?.json(answers);
        decode(send(req).await?).await
    }

    // ------------------------------------------------------------------
    // Assistant
    // ------------------------------------------------------------------

    /// Send a chat request and return the reply body as a text stream.
    ///
    /// Returns once the response head has arrived; a non-2xx status is
    /// reported here, before any text is read.
    pub async fn open_chat(&self, token: &str, request: &ChatRequest) -> Result<TextStream, SdkError> {
        let req = authorized(self.http.post(self.routes.chat()), token)?.json(request);
        let res = send(req).await?;
        Ok(TextStream::new(res))
    }

    /// Personalize a chapter for the signed-in reader.
    pub async fn personalize(
        &self,
        token: &str,
        request: &PersonalizeRequest,
    ) -> Result<String, SdkError> {
        let req = authorized(self.http.post(self.routes.personalize()), token)?.json(request);
        let body: PersonalizeResponse = decode(send(req).await?).await?;
        Ok(body.personalized_chapter_text)
    }

    /// Translate text into the request's target language.
    pub async fn translate(
        &self,
        token: &str,
        request: &TranslateRequest,
    ) -> Result<String, SdkError> {
        let req = authorized(self.http.post(self.routes.translate()), token)?.json(request);
        let body: TranslateResponse = decode(send(req).await?).await?;
        Ok(body.translated_text)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Attach the bearer token, refusing to build a request without one.
fn authorized(req: RequestBuilder, token: &str) -> Result<RequestBuilder, SdkError> {
    if token.trim().is_empty() {
        return Err(SdkError::AuthRequired);
    }
    Ok(req.bearer_auth(token))
}

/// Send and map any non-2xx status to [`SdkError::Rejected`].
async fn send(req: RequestBuilder) -> Result<Response, SdkError> {
    let res = req.send().await?;
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let detail = ErrorDetail::from_body(&body, status.canonical_reason().unwrap_or(""));
    debug!(status = status.as_u16(), %detail, "backend rejected request");
    Err(SdkError::Rejected {
        status: status.as_u16(),
        detail,
    })
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, SdkError> {
    let bytes = res.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
