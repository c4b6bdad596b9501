//! # JwtAuthProvider
//!
//! HS256 bearer tokens carrying the user id in `sub`, paired with Argon2
//! password hashing.

use chrono::{Duration, Utc};
use domains::{AuthProvider, Result, UserId};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{Argon2Hasher, AuthError};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct JwtAuthProvider {
    hasher: Argon2Hasher,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtAuthProvider {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            hasher: Argon2Hasher::new(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    fn claims_for(&self, user: UserId) -> Claims {
        let now = Utc::now();
        Claims {
            sub: user.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        }
    }
}

impl AuthProvider for JwtAuthProvider {
    fn hash_password(&self, password: &str) -> Result<String> {
        Ok(self.hasher.hash(password)?)
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        self.hasher.verify(password, hash)
    }

    fn issue_token(&self, user: UserId) -> Result<String> {
        encode(
            &Header::new(Algorithm::HS256),
            &self.claims_for(user),
            &self.encoding,
        )
        .map_err(|e| AuthError::Signing(e.to_string()).into())
    }

    fn verify_token(&self, token: &str) -> Result<UserId> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "rejected bearer token");
            AuthError::InvalidToken
        })?;
        let id: Uuid = data.claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        Ok(UserId::from(id))
    }
}
