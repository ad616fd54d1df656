//! JWT token management
//!
//! Issues and verifies the signed, time-bounded tokens that identify a principal.

use crate::auth::Role;
use crate::config::AuthConfig;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (principal id). Older tokens carry it as `id`.
    #[serde(alias = "id")]
    pub sub: String,
    /// Role name; absent or unrecognised on legacy tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// The verified identity carried by a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub subject_id: String,
    /// `None` when the token names no role we recognise
    pub role: Option<Role>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is malformed or its signature is invalid")]
    Malformed,

    #[error("token verification failed: {0}")]
    Other(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => {
                AppError::TokenExpired("Token has expired, please log in again".to_string())
            }
            TokenError::Malformed => {
                AppError::NotAuthorized("Not authorized, token failed".to_string())
            }
            TokenError::Other(msg) => AppError::Internal(format!("Token verification: {}", msg)),
        }
    }
}

/// Signs and verifies tokens with the shared HMAC secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ttl: config.token_ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject_id` valid for the configured window
    pub fn issue(&self, subject_id: &str, role: Role) -> Result<String, AppError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("Token lifetime overflows the calendar".to_string()))?;
        let claims = Claims {
            sub: subject_id.to_string(),
            role: Some(role.as_str().to_string()),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token. Never panics on attacker-controlled input.
    pub fn verify(&self, token: &str) -> Result<TokenSubject, TokenError> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(TokenSubject {
                role: data.claims.role.as_deref().and_then(|r| r.parse().ok()),
                subject_id: data.claims.sub,
            }),
            Err(e) => Err(match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                // A lapsed token is reported as expired whatever else is wrong with it.
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidToken
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::MissingAlgorithm
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::ImmatureSignature
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => {
                    if self.unverified_expiry_passed(token) {
                        TokenError::Expired
                    } else {
                        TokenError::Malformed
                    }
                }
                _ => TokenError::Other(e.to_string()),
            }),
        }
    }

    /// Reads `exp` without trusting the signature. Only used to classify a
    /// rejection; it never grants access.
    fn unverified_expiry_passed(&self, token: &str) -> bool {
        let mut insecure = Validation::new(Algorithm::HS256);
        insecure.insecure_disable_signature_validation();
        insecure.validate_exp = false;
        insecure.required_spec_claims.clear();

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &insecure)
            .map(|data| data.claims.exp < Utc::now().timestamp())
            .unwrap_or(false)
    }
}
