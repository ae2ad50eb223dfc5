use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::store::UserRecord;
use crate::types::{Role, SophisticationLevel};

/// Signed session-token claims. This shape is a wire contract: other
/// services read these field names out of the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    /// Active role used for default permission resolution.
    pub role: Role,
    /// Every granted role. Tokens minted before multi-role support omit
    /// this; consumers fall back to the single active role.
    #[serde(default)]
    pub roles: Vec<Role>,
    pub intelligence_level: SophisticationLevel,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Granted roles, tolerating legacy tokens without a roles list.
    pub fn granted_roles(&self) -> Vec<Role> {
        if self.roles.is_empty() {
            vec![self.role]
        } else {
            self.roles.clone()
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT signing secret is not configured")]
    MissingSecret,
    #[error("token has expired")]
    Expired,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token generation failed: {0}")]
    Signing(String),
}

/// Signs and verifies session tokens. Stateless and cheap to clone around;
/// tokens are never revoked, so verification needs no I/O.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(
        secret: &str,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        ttl_days: i64,
    ) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        let issuer = issuer.into();
        let audience = audience.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&issuer]);
        validation.set_audience(&[&audience]);
        // Expiry is checked against an injected clock after signature,
        // issuer and audience validation, see verify_at.
        validation.validate_exp = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
            audience,
            ttl: Duration::days(ttl_days),
        })
    }

    /// Fails only when the signing secret is unset; callers treat that as a
    /// fatal configuration error at startup.
    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        Self::new(
            &security.jwt_secret,
            security.jwt_issuer.clone(),
            security.jwt_audience.clone(),
            security.token_ttl_days,
        )
    }

    /// Token lifetime in seconds, as reported to clients.
    pub fn expires_in(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Mint a token for the principal as of now.
    pub fn issue(&self, user: &UserRecord) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now())
    }

    /// Mint with an explicit issue instant. Expiry is `now + ttl`.
    pub fn issue_at(&self, user: &UserRecord, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.active_role,
            roles: user.granted_roles.clone(),
            intelligence_level: user.level,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify against the system clock.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify with an explicit clock instant. Signature, issuer and audience
    /// are checked first; any mismatch is `Malformed`. A token is expired
    /// iff `now >= exp`, so the last instant a token is accepted is the
    /// second before its `exp` claim.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}
