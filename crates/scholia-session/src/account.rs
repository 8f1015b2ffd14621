//! Sign-in, sign-up and background quiz flows.

use scholia_models::{Identity, ModelError, QuizAnswers, QuizReceipt};
use scholia_sdk::{BearerCredentials, ScholiaClient, SdkError};
use tracing::info;

use crate::credential_store::CredentialStore;
use crate::error::SessionError;

/// Background quiz answers as entered; the user id is taken from the
/// signed-in identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuizInput {
    /// Python experience, 0–5.
    pub python_experience: u8,
    /// ROS experience, 0–5.
    pub ros_experience: u8,
    /// Has a GPU workstation.
    pub has_gpu: bool,
    /// Has an NVIDIA Jetson board.
    pub has_jetson: bool,
    /// Has access to a physical robot.
    pub has_robot_access: bool,
}

/// Account operations against the backend, writing into the credential
/// store.
#[derive(Debug, Clone)]
pub struct AccountFlows {
    client: ScholiaClient,
    credentials: CredentialStore,
}

fn require(field: &str, value: &str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(())
}

impl AccountFlows {
    /// Flows using `client` and writing `credentials`.
    pub fn new(client: ScholiaClient, credentials: CredentialStore) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Sign in and store the credential.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, SessionError> {
        require("email", email)?;
        require("password", password)?;

        let response = self.client.sign_in(email.trim(), password).await?;
        let credentials = BearerCredentials::from(response);
        let identity = credentials.identity.clone();
        self.credentials.login(credentials)?;
        Ok(identity)
    }

    /// Create an account. Does not sign in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), SessionError> {
        require("email", email)?;
        require("password", password)?;

        self.client.register(email.trim(), password).await?;
        info!(email = %email.trim(), "account created");
        Ok(())
    }

    /// Sign out.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        Ok(self.credentials.logout()?)
    }

    /// Submit background quiz answers for the signed-in viewer.
    pub async fn submit_quiz(&self, input: QuizInput) -> Result<QuizReceipt, SessionError> {
        let bearer = self.credentials.bearer().ok_or(SdkError::AuthRequired)?;
        let answers = QuizAnswers {
            user_id: bearer.identity.id,
            python_experience: input.python_experience,
            ros_experience: input.ros_experience,
            has_gpu: input.has_gpu,
            has_jetson: input.has_jetson,
            has_robot_access: input.has_robot_access,
        };
        answers.validate()?;

        let receipt = self.client.submit_quiz(&bearer.token, &answers).await?;
        info!(user = %bearer.identity.id, profile_id = receipt.profile_id, "background quiz submitted");
        Ok(receipt)
    }
}
