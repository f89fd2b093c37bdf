//! HMAC-signed auth tokens.
//!
//! Token layout: `base64("<user_id>:<expiry_unix>:<base64(hmac_sha256)>")`
//! where the signature covers `"<user_id>:<expiry_unix>"`. Tampered,
//! malformed and expired tokens all fail identically with `InvalidToken`.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{GophermartError, Result};

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Issues and verifies bearer tokens for authenticated endpoints.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Option<Duration>) -> Self {
        let ttl = match ttl {
            Some(ttl) if !ttl.is_zero() => ttl,
            _ => DEFAULT_TTL,
        };
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl,
        }
    }

    /// Generates a signed token for the user.
    pub fn issue(&self, user_id: i64) -> String {
        let expires = Utc::now().timestamp() + self.ttl.as_secs() as i64;
        let payload = format!("{user_id}:{expires}");
        let token = format!("{payload}:{}", self.sign(&payload));
        BASE64.encode(token.as_bytes())
    }

    /// Validates a token and returns the encoded user id.
    pub fn parse(&self, token: &str) -> Result<i64> {
        let raw = BASE64
            .decode(token.trim())
            .map_err(|_| GophermartError::InvalidToken)?;
        let raw = String::from_utf8(raw).map_err(|_| GophermartError::InvalidToken)?;

        let parts: Vec<&str> = raw.split(':').collect();
        if parts.len() != 3 {
            return Err(GophermartError::InvalidToken);
        }

        let payload = format!("{}:{}", parts[0], parts[1]);
        let signature = BASE64
            .decode(parts[2])
            .map_err(|_| GophermartError::InvalidToken)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| GophermartError::InvalidToken)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| GophermartError::InvalidToken)?;

        let user_id: i64 = parts[0].parse().map_err(|_| GophermartError::InvalidToken)?;
        let expires: i64 = parts[1].parse().map_err(|_| GophermartError::InvalidToken)?;

        if expires < Utc::now().timestamp() {
            return Err(GophermartError::InvalidToken);
        }

        Ok(user_id)
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(payload.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }
}
