//! Bearer-token minting and verification (`spec.md` §3, "Bearer token").
//! HS256 over a shared secret — the same HMAC-JWT shape the teacher's
//! `auth.rs` used for session tokens, with the claim set narrowed to what
//! SEP-10 actually needs: issuer, subject account, issued-at, expires-at.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Operator domain.
    pub iss: String,
    /// Authenticated Stellar account address.
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired or malformed")]
    Invalid,
}

pub fn mint_token(
    domain: &str,
    account: &str,
    secret: &str,
    expiration_hours: i64,
) -> Result<String, TokenError> {
    let now = Utc::now();
    let expire = now + Duration::hours(expiration_hours);

    let claims = Claims {
        iss: domain.to_string(),
        sub: account.to_string(),
        iat: now.timestamp() as usize,
        exp: expire.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| TokenError::Invalid)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| TokenError::Invalid)?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_and_verify_round_trips() {
        let secret = "a-secret-that-is-at-least-32-bytes-long!!";
        let token = mint_token("anchor.example.com", "GACCOUNT", secret, 24).unwrap();
        let claims = verify_token(&token, secret).unwrap();

        assert_eq!(claims.sub, "GACCOUNT");
        assert_eq!(claims.iss, "anchor.example.com");
    }

    #[test]
    fn expired_token_is_rejected() {
        let secret = "a-secret-that-is-at-least-32-bytes-long!!";
        let token = mint_token("anchor.example.com", "GACCOUNT", secret, -1).unwrap();
        assert!(verify_token(&token, secret).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let secret = "a-secret-that-is-at-least-32-bytes-long!!";
        let token = mint_token("anchor.example.com", "GACCOUNT", secret, 24).unwrap();
        assert!(verify_token(&token, "a-different-secret-32-bytes-long!").is_err());
    }
}
