//! Account wire types: sign-in, registration, profile and background quiz.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::identity::{Identity, UserId};

/// Highest value accepted for a self-assessed experience level.
pub const MAX_EXPERIENCE_LEVEL: u8 = 5;

// ---------------------------------------------------------------------------
// Sign-in / registration
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login` and `POST /auth/register`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SignInRequest {
    /// Account e-mail.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl std::fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Success body of `POST /auth/login`.
///
/// Accepts both `access_token` and `accessToken` spellings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignInResponse {
    /// Opaque bearer token.
    #[serde(alias = "accessToken")]
    pub access_token: String,
    /// Identity record of the signed-in viewer.
    pub user: Identity,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// User record returned by `GET /profile`.
///
/// Only the truthiness of `profile` matters to the reader: a viewer
/// without a completed background profile is sent to the quiz instead of
/// being offered personalization.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    /// Background profile, `null` or absent when the quiz was never taken.
    #[serde(default)]
    pub profile: serde_json::Value,
    /// Remaining fields of the record.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserRecord {
    /// `true` when the record carries a truthy profile.
    ///
    /// # Examples
    ///
    /// ```
    /// use scholia_models::UserRecord;
    ///
    /// let with: UserRecord = serde_json::from_str(r#"{"profile":{"ros_experience":2}}"#).unwrap();
    /// let without: UserRecord = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
    /// assert!(with.has_profile());
    /// assert!(!without.has_profile());
    /// ```
    pub fn has_profile(&self) -> bool {
        is_truthy(&self.profile)
    }
}

/// Truthiness of a JSON value: `null`, `false`, `0` and `""` are falsy,
/// everything else (including empty arrays and objects) is truthy.
fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Background quiz
// ---------------------------------------------------------------------------

/// Body of `POST /profile/quiz`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuizAnswers {
    /// Viewer answering the quiz.
    pub user_id: UserId,
    /// Python experience, 0 to 5.
    pub python_experience: u8,
    /// ROS experience, 0 to 5.
    pub ros_experience: u8,
    /// Has a discrete GPU.
    pub has_gpu: bool,
    /// Has a Jetson board.
    pub has_jetson: bool,
    /// Has access to a physical robot.
    pub has_robot_access: bool,
}

impl QuizAnswers {
    /// Check that experience levels are within `0..=5`.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (field, value) in [
            ("python_experience", self.python_experience),
            ("ros_experience", self.ros_experience),
        ] {
            if value > MAX_EXPERIENCE_LEVEL {
                return Err(ModelError::InvalidExperience {
                    field: field.to_string(),
                    value,
                    reason: format!("must be between 0 and {MAX_EXPERIENCE_LEVEL}"),
                });
            }
        }
        Ok(())
    }
}

/// Success body of `POST /profile/quiz`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuizReceipt {
    /// Backend status word, `"success"` on success.
    pub status: String,
    /// Human-readable confirmation.
    pub message: String,
    /// Id of the stored profile.
    pub profile_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(python: u8, ros: u8) -> QuizAnswers {
        QuizAnswers {
            user_id: UserId::new(1),
            python_experience: python,
            ros_experience: ros,
            has_gpu: true,
            has_jetson: false,
            has_robot_access: false,
        }
    }

    #[test]
    fn sign_in_response_accepts_camel_case_token() {
        let raw = r#"{"accessToken":"t-1","user":{"id":3,"email":"a@b.c"}}"#;
        let resp: SignInResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.access_token, "t-1");
        assert_eq!(resp.user.id, UserId::new(3));
    }

    #[test]
    fn sign_in_request_debug_hides_password() {
        let req = SignInRequest {
            email: "a@b.c".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{req:?}").contains("hunter2"));
    }

    #[test]
    fn profile_truthiness() {
        let falsy = ["null", "false", "0", "\"\""];
        for raw in falsy {
            let record: UserRecord =
                serde_json::from_str(&format!(r#"{{"profile":{raw}}}"#)).unwrap();
            assert!(!record.has_profile(), "{raw} should be falsy");
        }
        let truthy = ["{}", "[]", "1", "true", "\"yes\""];
        for raw in truthy {
            let record: UserRecord =
                serde_json::from_str(&format!(r#"{{"profile":{raw}}}"#)).unwrap();
            assert!(record.has_profile(), "{raw} should be truthy");
        }
    }

    #[test]
    fn quiz_levels_are_bounded() {
        assert!(answers(5, 0).validate().is_ok());
        let err = answers(2, 6).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid ros_experience 6: must be between 0 and 5"
        );
    }
}
