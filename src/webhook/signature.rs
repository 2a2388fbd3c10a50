use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::RuntimeEnvironment;
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verifies the HMAC-SHA256 signature a webhook source attaches to each delivery.
///
/// The header has the form `sha256=<lowercase hex>` and is computed over the
/// exact request bytes.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

// Manual Debug impl to avoid leaking the webhook secret
impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl SignatureVerifier {
    /// An empty secret is only tolerated in development.
    pub fn new(secret: &str, environment: RuntimeEnvironment) -> Result<Self> {
        if secret.is_empty() {
            if !environment.is_development() {
                return Err(AppError::Config(
                    "webhook.secret must be set outside development".to_string(),
                ));
            }
            tracing::warn!("Webhook secret is empty; signatures are checked against an empty key");
        }

        Ok(Self {
            secret: secret.to_string(),
        })
    }

    /// Returns `false` for any malformed header or mismatch; never errors.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> bool {
        match self.check(payload, signature_header) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Webhook signature rejected");
                false
            }
        }
    }

    fn check(&self, payload: &[u8], signature_header: &str) -> Result<()> {
        let signature_hex = signature_header
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or_else(|| AppError::WebhookVerification("Missing sha256= prefix".to_string()))?;

        let signature_bytes = hex::decode(signature_hex)
            .map_err(|e| AppError::WebhookVerification(format!("Invalid hex in signature: {e}")))?;

        let mut mac = self.mac()?;
        mac.update(payload);

        // verify_slice compares in constant time
        mac.verify_slice(&signature_bytes)
            .map_err(|_| AppError::WebhookVerification("Signature mismatch".to_string()))
    }

    /// Canonical `sha256=<hex>` header for `payload`.
    pub fn sign(&self, payload: &[u8]) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(payload);
        Ok(format!(
            "{SIGNATURE_PREFIX}{}",
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::WebhookVerification(format!("Invalid HMAC key: {e}")))
    }
}
