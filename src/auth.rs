use crate::error::AppError;
use crate::schemas::UserId;
use actix_web::{http::header::HeaderValue, HttpRequest};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::num::ParseIntError;

type HmacSha256 = Hmac<Sha256>;

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
}

/// Key material derived once from the configured secret.
#[derive(Clone)]
pub struct TokenKey {
    key: Vec<u8>,
}

impl TokenKey {
    pub fn new(secret: &str) -> Self {
        let mut sha256_hasher = Sha256::new();
        sha256_hasher.update(secret.as_bytes());
        Self {
            key: sha256_hasher.finalize().to_vec(),
        }
    }

    fn sign(&self, content: &str) -> HmacSha256 {
        let mut hmac_hasher =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take a key of any size");
        hmac_hasher.update(content.as_bytes());
        hmac_hasher
    }
}

/// Issues a token of the form `{user_id}.{expires_at}.{hex signature}`.
pub fn issue_token(key: &TokenKey, user_id: UserId, expires_at: DateTime<Utc>) -> String {
    let content = format!("{}.{}", user_id, expires_at.timestamp());
    let signature = key
        .sign(&content)
        .finalize()
        .into_bytes()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<String>();
    format!("{}.{}", content, signature)
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    hex.chars()
        .collect::<Vec<_>>()
        .chunks(2)
        .map(|n| u8::from_str_radix(&String::from_iter(n), 16))
        .collect::<Result<Vec<u8>, ParseIntError>>()
        .ok()
}

pub fn verify_token(
    key: &TokenKey,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Principal, AppError> {
    let invalid = || AppError::Unauthorized("token failed".to_string());

    let (content, signature) = token.rsplit_once('.').ok_or_else(invalid)?;
    let (user_id, expires_at) = content.split_once('.').ok_or_else(invalid)?;
    let signature = decode_hex(signature).ok_or_else(invalid)?;

    key.sign(content)
        .verify_slice(&signature)
        .map_err(|_| invalid())?;

    let user_id: UserId = user_id.parse().map_err(|_| invalid())?;
    let expires_at: i64 = expires_at.parse().map_err(|_| invalid())?;
    if expires_at <= now.timestamp() {
        return Err(AppError::Unauthorized("token expired".to_string()));
    }
    Ok(Principal { user_id })
}

/// Resolves the principal from an `Authorization: Bearer <token>` header.
pub fn authenticate(request: &HttpRequest, key: &TokenKey) -> Result<Principal, AppError> {
    let token = request
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .map(HeaderValue::to_str)
        .and_then(Result::ok)
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("no token".to_string()))?;
    let principal = verify_token(key, token.trim(), Utc::now())?;
    tracing::debug!(user_id = principal.user_id, "authenticated request");
    Ok(principal)
}
