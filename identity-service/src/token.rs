//! JWT access and refresh tokens
//!
//! Tokens are HS256-signed. Access tokens authenticate API calls; refresh
//! tokens only mint new access tokens. Logging out revokes a refresh token by
//! remembering its `jti` until it would have expired anyway.

use chrono::{Duration, Utc};
use common::error::{Error, Result};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Which of the pair a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by every token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Unique token ID
    pub jti: Uuid,
    pub token_type: TokenType,
    /// Issued at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
}

/// Freshly issued access and refresh tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and checks tokens for one signing secret
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    /// Revoked refresh token IDs, with their expiry
    revoked: DashMap<Uuid, i64>,
}

impl TokenService {
    /// Create a token service signing with `secret`
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
            revoked: DashMap::new(),
        }
    }

    /// Issue an access/refresh pair for a user
    pub fn issue(&self, user_id: Uuid) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.sign(user_id, TokenType::Access, self.access_ttl)?,
            refresh: self.sign(user_id, TokenType::Refresh, self.refresh_ttl)?,
        })
    }

    /// Check an access token and return its claims
    pub fn validate_access(&self, token: &str) -> Result<Claims> {
        self.decode_as(token, TokenType::Access)
    }

    /// Mint a new access token from a live refresh token
    pub fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = self.decode_as(refresh_token, TokenType::Refresh)?;
        self.sign(claims.sub, TokenType::Access, self.access_ttl)
    }

    /// Revoke a refresh token of `user_id` so it can no longer be used
    pub fn revoke(&self, refresh_token: &str, user_id: Uuid) -> Result<()> {
        let claims = self.decode_as(refresh_token, TokenType::Refresh)?;
        if claims.sub != user_id {
            return Err(Error::AuthenticationError(
                "Token was not issued to this user".to_string(),
            ));
        }

        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);
        self.revoked.insert(claims.jti, claims.exp);

        debug!("Revoked refresh token {} of user {}", claims.jti, claims.sub);
        Ok(())
    }

    fn sign(&self, user_id: Uuid, token_type: TokenType, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
    }

    fn decode_as(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| Error::AuthenticationError(format!("Invalid token: {}", e)))?
            .claims;

        if claims.token_type != expected {
            return Err(Error::AuthenticationError(format!(
                "Expected a {:?} token, got {:?}",
                expected, claims.token_type
            )));
        }
        if self.revoked.contains_key(&claims.jti) {
            return Err(Error::AuthenticationError("Token has been revoked".to_string()));
        }

        Ok(claims)
    }
}
