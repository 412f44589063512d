//! Password hashing, bearer tokens and sessions.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use aula_core::User;

use crate::{AcademicService, ServiceError};

pub const TOKEN_PREFIX: &str = "aula_";
const TOKEN_LEN: usize = 43;
const SALT_LEN: usize = 16;
const BASE62: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BAD_CREDENTIALS: &str = "invalid national id or password";

/// Returned once at login; only the token's hash is kept.
#[derive(Debug, Clone, Serialize)]
pub struct LoginSession {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

pub fn sha256_hex(input: &[u8]) -> String {
    hex(&Sha256::digest(input))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn unhex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

/// `aula_` followed by 43 base62 characters.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..TOKEN_LEN)
        .map(|_| BASE62[rng.gen_range(0..BASE62.len())] as char)
        .collect();
    format!("{TOKEN_PREFIX}{body}")
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

/// `sha256$<salt-hex>$<digest-hex>`.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::thread_rng().gen();
    format!(
        "sha256${}${}",
        hex(&salt),
        hex(&salted_digest(&salt, password))
    )
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some("sha256"), Some(salt), Some(digest)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let (Some(salt), Some(expected)) = (unhex(salt), unhex(digest)) else {
        return false;
    };
    constant_time_eq(&salted_digest(&salt, password), &expected)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl AcademicService {
    pub async fn login(&self, national_id: &str, password: &str) -> Result<LoginSession, ServiceError> {
        let Some((user, stored)) = self.db.find_credentials(national_id.trim()).await? else {
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.into()));
        };
        if !verify_password(password, &stored) {
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.into()));
        }
        if !user.active {
            return Err(ServiceError::Forbidden("account is inactive".into()));
        }

        let now = Utc::now();
        let purged = self.db.purge_expired_sessions(now).await?;
        if purged > 0 {
            debug!(purged, "removed expired sessions");
        }

        let token = generate_token();
        let expires_at = now + self.token_ttl;
        self.db
            .create_session(user.id, &sha256_hex(token.as_bytes()), expires_at)
            .await?;
        info!(user_id = user.id, role = %user.role, "user logged in");

        Ok(LoginSession {
            token,
            token_type: "bearer".into(),
            expires_at,
            user,
        })
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<User, ServiceError> {
        if !token.starts_with(TOKEN_PREFIX) {
            return Err(ServiceError::Unauthorized("invalid token".into()));
        }
        let user = self
            .db
            .find_session_user(&sha256_hex(token.as_bytes()), Utc::now())
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("invalid or expired token".into()))?;
        if !user.active {
            return Err(ServiceError::Forbidden("account is inactive".into()));
        }
        Ok(user)
    }

    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.db.delete_session(&sha256_hex(token.as_bytes())).await?;
        Ok(())
    }
}
