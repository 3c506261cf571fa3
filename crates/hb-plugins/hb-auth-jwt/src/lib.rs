//! # hb-auth-jwt
//!
//! Argon2 + HS256 implementation of `AuthProvider`.
//! Handles the single configured admin account and its signed session tokens.

use anyhow::Context;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use hb_core::{AdminClaims, AuthError, AuthProvider, ADMIN_ROLE};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};

pub struct JwtAuthProvider {
    admin_username: String,
    /// Argon2 PHC string for the admin password
    admin_password_hash: SecretString,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtAuthProvider {
    pub fn new(
        secret: &SecretString,
        admin_username: impl Into<String>,
        admin_password_hash: SecretString,
        ttl: Duration,
    ) -> Self {
        let key = secret.expose_secret().as_bytes();
        Self {
            admin_username: admin_username.into(),
            admin_password_hash,
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation
    }
}

/// Produces an Argon2id PHC string suitable for `auth.admin_password_hash`.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("argon2 hashing failed: {e}"))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "admin password hash is not a valid PHC string");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    /// Always runs the password check so a wrong username costs the same as a wrong password.
    async fn verify_admin_credentials(&self, username: &str, password: &str) -> bool {
        let username_ok = username == self.admin_username;
        let password_ok = verify_password(password, self.admin_password_hash.expose_secret());
        username_ok && password_ok
    }

    fn issue_token(&self, username: &str) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = AdminClaims {
            username: username.to_string(),
            role: ADMIN_ROLE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("failed to sign admin token")
    }

    fn decode_token(&self, token: &str) -> Result<AdminClaims, AuthError> {
        decode::<AdminClaims>(token, &self.decoding_key, &Self::validation())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "admin token rejected");
                AuthError::InvalidOrExpiredToken
            })
    }
}
