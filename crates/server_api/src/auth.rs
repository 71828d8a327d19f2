//! Admin credential check and signed admin-session tokens.
//!
//! The password is kept only as an argon2id hash. A successful login yields a
//! short JWT that the HTTP layer stores in a cookie and hands back on every
//! admin request; nothing about the session lives in process memory.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ADMIN_SUBJECT: &str = "admin";

/// Hash a password using argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

#[derive(Debug, Clone)]
pub struct AdminCredential {
    phc_hash: Option<String>,
}

impl AdminCredential {
    /// Accepts an argon2 PHC string as produced by [`hash_password`].
    pub fn from_hash(phc_hash: &str) -> Result<Self, argon2::password_hash::Error> {
        PasswordHash::new(phc_hash)?;
        Ok(Self {
            phc_hash: Some(phc_hash.to_string()),
        })
    }

    pub fn from_plaintext(password: &str) -> Result<Self, argon2::password_hash::Error> {
        Ok(Self {
            phc_hash: Some(hash_password(password)?),
        })
    }

    /// A credential no password can satisfy.
    pub fn disabled() -> Self {
        Self { phc_hash: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.phc_hash.is_some()
    }

    pub fn verify(&self, candidate: &str) -> bool {
        let Some(phc_hash) = self.phc_hash.as_deref() else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(phc_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    jti: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Keys signed with a secret that dies with the process.
    pub fn ephemeral(ttl: Duration) -> Self {
        let mut secret = Vec::with_capacity(32);
        secret.extend_from_slice(Uuid::new_v4().as_bytes());
        secret.extend_from_slice(Uuid::new_v4().as_bytes());
        Self::new(&secret, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, now: DateTime<Utc>) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = SessionClaims {
            sub: ADMIN_SUBJECT.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Expiry is checked against `now` rather than the wall clock.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Option<AdminSession> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<SessionClaims>(token, &self.decoding, &validation)
            .ok()?
            .claims;
        if claims.sub != ADMIN_SUBJECT {
            return None;
        }
        let expires_at = Utc.timestamp_opt(claims.exp, 0).single()?;
        if now >= expires_at {
            return None;
        }
        Some(AdminSession {
            session_id: claims.jti,
            expires_at,
        })
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
