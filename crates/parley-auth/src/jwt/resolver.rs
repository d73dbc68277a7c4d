//! JWT-backed identity resolution.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use parley_core::config::AuthConfig;
use parley_core::error::AppError;
use parley_core::result::AppResult;
use parley_core::traits::IdentityResolver;
use parley_core::types::id::UserId;

use super::claims::Claims;

/// Verifies HS256 tokens and returns the user named in `sub`.
#[derive(Clone)]
pub struct JwtIdentityResolver {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtIdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityResolver")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtIdentityResolver {
    /// Creates a new resolver from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a token string.
    pub fn decode_claims(&self, token: &str) -> AppResult<Claims> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication("Token validation failed"),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, credential: &str) -> AppResult<UserId> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(AppError::authentication("Authentication token is required"));
        }

        let claims = self.decode_claims(credential)?;
        debug!(user_id = %claims.sub, expires_at = %claims.expires_at(), "Token verified");
        Ok(claims.user_id())
    }
}
