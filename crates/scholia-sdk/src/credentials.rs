//! Bearer credentials returned by the authentication endpoint.

use std::fmt;

use scholia_models::{Identity, SignInResponse};

/// A bearer token together with the identity it was issued for.
///
/// Both halves are persisted and restored together; a token without an
/// identity (or the reverse) is never a valid credential.
#[derive(Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BearerCredentials {
    /// Opaque bearer token sent as `Authorization: Bearer …`.
    pub token: String,
    /// Identity record of the token holder.
    pub identity: Identity,
}

impl BearerCredentials {
    /// Pair a token with its identity.
    pub fn new(token: impl Into<String>, identity: Identity) -> Self {
        Self {
            token: token.into(),
            identity,
        }
    }
}

impl From<SignInResponse> for BearerCredentials {
    fn from(resp: SignInResponse) -> Self {
        Self::new(resp.access_token, resp.user)
    }
}

impl fmt::Debug for BearerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerCredentials")
            .field("token", &"<redacted>")
            .field("identity", &self.identity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholia_models::UserId;

    #[test]
    fn debug_never_prints_the_token() {
        let creds = BearerCredentials::new("secret-token", Identity::new(UserId::new(1), "a@b.c"));
        let printed = format!("{creds:?}");
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("a@b.c"));
    }
}
