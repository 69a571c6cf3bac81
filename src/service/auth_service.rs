//! SEP-10 issuer (`spec.md` §4.2): builds challenges, verifies them, and
//! mints the bearer token the rest of the API then trusts.

use std::sync::Arc;

use crate::auth::{self, TokenError};
use crate::challenge::{self, ChallengeError};
use crate::horizon::HorizonError;

use super::ServiceContainer;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error(transparent)]
    Challenge(#[from] ChallengeError),
    #[error("account lookup failed: {0}")]
    Horizon(#[from] HorizonError),
    #[error("nonce has already been used")]
    NonceReplayed,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("requested account is not a valid Stellar address")]
    InvalidAccount,
}

pub struct Challenge {
    pub transaction_xdr: String,
    pub network_passphrase: String,
}

/// Build and register a fresh challenge for `account`.
pub async fn create_challenge(
    services: &ServiceContainer,
    account: &str,
    home_domain: Option<&str>,
) -> Result<Challenge, AuthServiceError> {
    stellar_base::crypto::KeyPair::from_public_key(account)
        .map_err(|_| AuthServiceError::InvalidAccount)?;

    let web_auth_domain = home_domain.unwrap_or(&services.config.domain);

    let issued = challenge::build_challenge(
        &services.signing_keypair(),
        &services.network(),
        &services.config.domain,
        web_auth_domain,
        account,
    )?;

    services.nonces.add(&issued.nonce);

    Ok(Challenge {
        transaction_xdr: issued.transaction_xdr,
        network_passphrase: services.config.network.passphrase().to_string(),
    })
}

/// Verify a client-submitted challenge and mint the bearer token on
/// success. Consumes the nonce exactly once.
pub async fn verify_challenge(
    services: &Arc<ServiceContainer>,
    transaction_xdr: &str,
) -> Result<String, AuthServiceError> {
    let signing_key = services.signing_keypair();
    let network = services.network();

    let account = challenge::peek_account(transaction_xdr)?;
    let thresholds = services.horizon.account_thresholds(&account).await?;

    let verified = challenge::verify_challenge(
        transaction_xdr,
        &signing_key,
        &network,
        &services.config.domain,
        &thresholds,
    )?;

    if !services.nonces.consume(&verified.nonce) {
        return Err(AuthServiceError::NonceReplayed);
    }

    let token = auth::mint_token(
        &services.config.domain,
        &verified.account,
        &services.config.jwt.secret,
        services.config.jwt.expiration_hours,
    )?;

    Ok(token)
}
