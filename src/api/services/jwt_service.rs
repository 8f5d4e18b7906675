//! JWT issuing and validation for API authentication.
//!
//! - Access tokens: short-lived (15 minutes), sent as `Authorization: Bearer`
//! - Refresh tokens: longer-lived (7 days), exchanged at `/auth/refresh`
//!
//! The subject claim is the user id.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

const ACCESS_TOKEN_MINUTES: i64 = 15;
const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token signature")]
    BadSignature,
    #[error("Expected {expected:?} token")]
    WrongType { expected: TokenType },
    #[error("Invalid token subject")]
    BadSubject,
    #[error("Malformed token: {0}")]
    Malformed(String),
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: TokenType,
    /// Carried across refreshes
    pub session_id: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::BadSubject)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: i64,
    pub refresh_token_expires_at: i64,
    pub token_type: String,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// `AppConfig` rejects secrets shorter than 32 bytes in production.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    pub fn generate_token_pair(
        &self,
        user_id: Uuid,
        email: &str,
        session_id: &str,
    ) -> Result<TokenPair, TokenError> {
        let now = Utc::now();
        let access_exp = now + Duration::minutes(ACCESS_TOKEN_MINUTES);
        let refresh_exp = now + Duration::days(REFRESH_TOKEN_DAYS);

        let sign = |token_type: TokenType, exp: DateTime<Utc>| {
            let claims = Claims {
                sub: user_id.to_string(),
                email: email.to_string(),
                exp: exp.timestamp(),
                iat: now.timestamp(),
                token_type,
                session_id: session_id.to_string(),
            };
            encode(&Header::default(), &claims, &self.encoding_key)
                .map_err(|e| TokenError::Signing(e.to_string()))
        };

        let pair = TokenPair {
            access_token: sign(TokenType::Access, access_exp)?,
            refresh_token: sign(TokenType::Refresh, refresh_exp)?,
            access_token_expires_at: access_exp.timestamp(),
            refresh_token_expires_at: refresh_exp.timestamp(),
            token_type: "Bearer".to_string(),
        };
        debug!(user_id = %user_id, session_id = %session_id, "Issued token pair");
        Ok(pair)
    }

    /// Verify signature, expiry and token type.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e.to_string()),
            })?
            .claims;
        if claims.token_type != expected {
            return Err(TokenError::WrongType { expected });
        }
        Ok(claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate(token, TokenType::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate(token, TokenType::Refresh)
    }

    /// New pair for the subject of already-validated refresh claims, same session.
    pub fn reissue(&self, refresh_claims: &Claims) -> Result<TokenPair, TokenError> {
        let user_id = refresh_claims.user_id()?;
        self.generate_token_pair(user_id, &refresh_claims.email, &refresh_claims.session_id)
    }

    pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
        auth_header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
    }
}
