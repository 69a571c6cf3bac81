//! SEP-10 challenge transaction construction and verification (`spec.md`
//! §4.2). This is the one module in the crate that speaks raw Stellar
//! transaction XDR; everything above it works with plain strings and
//! `chrono` timestamps so the rest of the auth flow stays ordinary Rust.
//!
//! The challenge is an unsubmitted, unsequenced transaction: source
//! account is the operator's signing key, sequence number `0`, two
//! `manage_data` operations (`<domain> auth` carrying a random 48-byte
//! nonce, and `web_auth_domain` carrying the domain the client
//! authenticated against), and a 300-second time bound. The operator signs
//! it when issuing it; the client must countersign with the account it's
//! proving ownership of before it comes back for verification.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Duration as ChronoDuration, Utc};
use rand::RngCore;
use stellar_base::crypto::KeyPair;
use stellar_base::network::Network;
use stellar_base::operations::Operation;
use stellar_base::time_bounds::TimeBounds;
use stellar_base::transaction::{Transaction, MIN_BASE_FEE};
use stellar_base::xdr::{XDRDeserialize, XDRSerialize};

use crate::horizon::AccountThresholds;

pub const CHALLENGE_VALID_SECONDS: i64 = 300;
const NONCE_BYTES: usize = 48;

#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    #[error("failed to build challenge transaction: {0}")]
    Build(String),
    #[error("challenge transaction xdr is malformed")]
    Malformed,
    #[error("challenge transaction source account does not match the operator's signing key")]
    WrongSource,
    #[error("challenge transaction is missing the expected manage_data operations")]
    MissingOperations,
    #[error("challenge transaction domain does not match")]
    DomainMismatch,
    #[error("challenge transaction has expired")]
    Expired,
    #[error("challenge transaction is not yet signed by the operator")]
    MissingServerSignature,
    #[error("client signature weight {actual} does not meet the required threshold {required}")]
    InsufficientWeight { actual: u32, required: u32 },
}

pub struct IssuedChallenge {
    pub transaction_xdr: String,
    pub nonce: Vec<u8>,
}

/// Build a signed, unsubmitted challenge transaction for `client_account`.
pub fn build_challenge(
    signing_key: &KeyPair,
    network: &Network,
    domain: &str,
    web_auth_domain: &str,
    client_account: &str,
) -> Result<IssuedChallenge, ChallengeError> {
    let mut nonce = vec![0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut nonce);
    let nonce_value = STANDARD.encode(&nonce);

    let now = Utc::now();
    let time_bounds = TimeBounds::new(
        now.timestamp() as u64,
        (now + ChronoDuration::seconds(CHALLENGE_VALID_SECONDS)).timestamp() as u64,
    )
    .map_err(|e| ChallengeError::Build(e.to_string()))?;

    let domain_key = format!("{} auth", domain);
    let domain_op = Operation::new_manage_data()
        .with_name(domain_key)
        .with_value(Some(nonce_value.into_bytes()))
        .build()
        .map_err(|e| ChallengeError::Build(e.to_string()))?;

    let web_auth_op = Operation::new_manage_data()
        .with_name("web_auth_domain".to_string())
        .with_value(Some(web_auth_domain.as_bytes().to_vec()))
        .build()
        .map_err(|e| ChallengeError::Build(e.to_string()))?;

    let client_source = KeyPair::from_public_key(client_account)
        .map_err(|_| ChallengeError::Build("invalid client account".to_string()))?;

    let mut transaction = Transaction::builder(signing_key.public_key().clone(), 0, MIN_BASE_FEE)
        .with_time_bounds(time_bounds)
        .add_operation(source_scoped(domain_op, &client_source))
        .add_operation(web_auth_op)
        .into_transaction()
        .map_err(|e| ChallengeError::Build(e.to_string()))?;

    transaction
        .sign(signing_key, network)
        .map_err(|e| ChallengeError::Build(e.to_string()))?;

    let envelope = transaction.into_envelope();
    let transaction_xdr = envelope
        .xdr_base64()
        .map_err(|_| ChallengeError::Build("failed to encode challenge transaction".to_string()))?;

    Ok(IssuedChallenge {
        transaction_xdr,
        nonce,
    })
}

/// Re-point a manage_data operation's `source_account` at the client, so
/// the nonce entry is attributable to the account proving ownership
/// rather than to the operator's own signing key.
fn source_scoped(
    mut operation: stellar_base::operations::Operation,
    source: &KeyPair,
) -> stellar_base::operations::Operation {
    operation.set_source_account(Some(source.public_key().clone()));
    operation
}

/// Extract the client account from a challenge transaction without
/// verifying signatures or expiry yet — used to look up that account's
/// signer set before running full verification.
pub fn peek_account(transaction_xdr: &str) -> Result<String, ChallengeError> {
    let envelope = stellar_base::xdr::TransactionEnvelope::from_xdr_base64(transaction_xdr)
        .map_err(|_| ChallengeError::Malformed)?;
    let transaction = Transaction::from_envelope(&envelope).map_err(|_| ChallengeError::Malformed)?;

    transaction
        .operations()
        .iter()
        .find(|op| op.body_name() == "manage_data")
        .and_then(|op| op.source_account())
        .map(|account| account.account_id())
        .ok_or(ChallengeError::MissingOperations)
}

pub struct VerifiedChallenge {
    pub account: String,
    pub nonce: Vec<u8>,
}

/// Parse a client-submitted challenge and verify every invariant `spec.md`
/// §4.2 step 5 lists: well-formed XDR, expected source, matching domain,
/// not expired, operator signature present, and client signature weight
/// meeting the account's medium threshold.
pub fn verify_challenge(
    transaction_xdr: &str,
    signing_key: &KeyPair,
    network: &Network,
    domain: &str,
    thresholds: &AccountThresholds,
) -> Result<VerifiedChallenge, ChallengeError> {
    let envelope = stellar_base::xdr::TransactionEnvelope::from_xdr_base64(transaction_xdr)
        .map_err(|_| ChallengeError::Malformed)?;
    let transaction = Transaction::from_envelope(&envelope).map_err(|_| ChallengeError::Malformed)?;

    if transaction.source_account() != signing_key.public_key() {
        return Err(ChallengeError::WrongSource);
    }

    let operations = transaction.operations();
    if operations.len() < 2 {
        return Err(ChallengeError::MissingOperations);
    }

    let domain_key = format!("{} auth", domain);
    let domain_op = operations
        .iter()
        .find(|op| op.body_name() == "manage_data" && op.manage_data_name() == Some(domain_key.as_str()))
        .ok_or(ChallengeError::MissingOperations)?;

    let nonce = domain_op
        .manage_data_value()
        .ok_or(ChallengeError::MissingOperations)?
        .to_vec();

    let account = domain_op
        .source_account()
        .ok_or(ChallengeError::MissingOperations)?
        .account_id();

    let web_auth_op = operations
        .iter()
        .find(|op| op.body_name() == "manage_data" && op.manage_data_name() == Some("web_auth_domain"));
    if let Some(op) = web_auth_op {
        let value = op.manage_data_value().unwrap_or_default();
        if value != domain.as_bytes() {
            return Err(ChallengeError::DomainMismatch);
        }
    }

    let now = Utc::now().timestamp() as u64;
    let bounds = transaction.time_bounds().ok_or(ChallengeError::Expired)?;
    if now < bounds.min_time() || now > bounds.max_time() {
        return Err(ChallengeError::Expired);
    }

    let hash = transaction
        .hash(network)
        .map_err(|_| ChallengeError::Malformed)?;

    let mut server_signed = false;
    let mut client_weight = 0u32;
    for signature in envelope.signatures() {
        if signing_key.public_key().verify(&hash, signature) {
            server_signed = true;
            continue;
        }
        for signer in &thresholds.signers {
            if let Ok(signer_key) = KeyPair::from_public_key(&signer.key) {
                if signer_key.public_key().verify(&hash, signature) {
                    client_weight += signer.weight;
                }
            }
        }
    }

    if !server_signed {
        return Err(ChallengeError::MissingServerSignature);
    }

    if client_weight < thresholds.medium_threshold.max(1) {
        return Err(ChallengeError::InsufficientWeight {
            actual: client_weight,
            required: thresholds.medium_threshold.max(1),
        });
    }

    Ok(VerifiedChallenge { account, nonce })
}
