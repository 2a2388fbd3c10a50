use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::error::{AppError, Result};

/// Backdated to tolerate clock drift between us and GitHub.
const ISSUED_AT_SKEW_SECS: i64 = 60;
/// GitHub rejects app JWTs valid for longer than ten minutes.
const MAX_LIFETIME_SECS: i64 = 10 * 60;

#[derive(Debug, Serialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

/// RSA signing key of the GitHub App, parsed once at startup.
#[derive(Clone)]
pub struct AppSigner {
    app_id: u64,
    key: EncodingKey,
}

impl std::fmt::Debug for AppSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSigner")
            .field("app_id", &self.app_id)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl AppSigner {
    pub fn from_pem(app_id: u64, key_pem: &[u8]) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(key_pem)
            .map_err(|e| AppError::Config(format!("Invalid GitHub App private key: {e}")))?;
        Ok(Self { app_id, key })
    }

    /// Short-lived JWT used to mint installation tokens.
    pub fn app_jwt(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = AppClaims {
            iat: now - ISSUED_AT_SKEW_SECS,
            exp: now + MAX_LIFETIME_SECS,
            iss: self.app_id.to_string(),
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| AppError::Internal(format!("Failed to sign GitHub App JWT: {e}")))
    }
}
