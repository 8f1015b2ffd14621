//! Mock backend configuration.
//!
//! Built from environment variables at startup.

/// Startup configuration of the standalone mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Port to listen on (default `8000`).
    pub listen_port: u16,
    /// E-mail of the account seeded at startup.
    pub demo_email: String,
    /// Password of the seeded account.
    pub demo_password: String,
}

impl BackendConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable             | Default              | Description                 |
    /// |----------------------|----------------------|-----------------------------|
    /// | `MOCK_BACKEND_PORT`  | `8000`               | HTTP listen port            |
    /// | `MOCK_DEMO_EMAIL`    | `demo@scholia.local` | Seeded account e-mail       |
    /// | `MOCK_DEMO_PASSWORD` | `demo`               | Seeded account password     |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let listen_port = lookup("MOCK_BACKEND_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000);
        Self {
            listen_port,
            demo_email: lookup("MOCK_DEMO_EMAIL").unwrap_or_else(|| "demo@scholia.local".into()),
            demo_password: lookup("MOCK_DEMO_PASSWORD").unwrap_or_else(|| "demo".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = BackendConfig::from_lookup(|_| None);
        assert_eq!(cfg.listen_port, 8000);
        assert_eq!(cfg.demo_email, "demo@scholia.local");
    }

    #[test]
    fn unparsable_port_falls_back() {
        let cfg = BackendConfig::from_lookup(|key| match key {
            "MOCK_BACKEND_PORT" => Some("eighty".into()),
            "MOCK_DEMO_PASSWORD" => Some("hunter2".into()),
            _ => None,
        });
        assert_eq!(cfg.listen_port, 8000);
        assert_eq!(cfg.demo_password, "hunter2");
    }
}
