//! Thin Horizon client used only for the SEP-10 signer/threshold lookup
//! (`spec.md` §4.2, step 5). Built on `reqwest` the same way the teacher's
//! services call out to external HTTP APIs, with a bounded timeout so a
//! slow Horizon never stalls a verify request indefinitely.

use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum HorizonError {
    #[error("horizon request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected horizon response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct Signer {
    pub key: String,
    pub weight: u32,
}

/// The subset of an account's state SEP-10 verification needs: its signer
/// set and the threshold a transaction must clear.
#[derive(Debug, Clone)]
pub struct AccountThresholds {
    pub signers: Vec<Signer>,
    pub medium_threshold: u32,
}

#[derive(Debug, Deserialize)]
struct HorizonSigner {
    key: String,
    weight: u32,
}

#[derive(Debug, Deserialize)]
struct HorizonThresholds {
    med_threshold: u32,
}

#[derive(Debug, Deserialize)]
struct HorizonAccount {
    signers: Vec<HorizonSigner>,
    thresholds: HorizonThresholds,
}

#[derive(Clone)]
pub struct HorizonClient {
    base_url: String,
    http: reqwest::Client,
}

impl HorizonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builder is infallible for this configuration");

        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// Fetch the signer set and medium threshold for `account`. A 404
    /// (account not yet funded on-chain) is not an error: the account is
    /// its own sole signer with weight 1 and threshold 0, per `spec.md`
    /// §4.2 step 5.
    pub async fn account_thresholds(
        &self,
        account: &str,
    ) -> Result<AccountThresholds, HorizonError> {
        let url = format!("{}/accounts/{}", self.base_url.trim_end_matches('/'), account);
        let response = self.http.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(AccountThresholds {
                signers: vec![Signer {
                    key: account.to_string(),
                    weight: 1,
                }],
                medium_threshold: 0,
            });
        }

        let response = response.error_for_status()?;
        let body: HorizonAccount = response
            .json()
            .await
            .map_err(|e| HorizonError::Decode(e.to_string()))?;

        Ok(AccountThresholds {
            signers: body
                .signers
                .into_iter()
                .map(|s| Signer {
                    key: s.key,
                    weight: s.weight,
                })
                .collect(),
            medium_threshold: body.thresholds.med_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use serde_json::json;

    #[tokio::test]
    async fn account_thresholds_parses_signers_and_threshold() {
        let server = MockServer::start();
        let account = "GACCOUNT";
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path(format!("/accounts/{account}"));
            then.status(200).json_body(json!({
                "signers": [
                    { "key": account, "weight": 1 },
                    { "key": "GCOSIGNER", "weight": 2 }
                ],
                "thresholds": { "low_threshold": 0, "med_threshold": 2, "high_threshold": 3 }
            }));
        });

        let client = HorizonClient::new(server.base_url());
        let thresholds = client.account_thresholds(account).await.unwrap();

        mock.assert();
        assert_eq!(thresholds.medium_threshold, 2);
        assert_eq!(thresholds.signers.len(), 2);
    }

    #[tokio::test]
    async fn account_thresholds_defaults_on_404() {
        let server = MockServer::start();
        let account = "GUNFUNDED";
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path(format!("/accounts/{account}"));
            then.status(404).json_body(json!({ "status": 404 }));
        });

        let client = HorizonClient::new(server.base_url());
        let thresholds = client.account_thresholds(account).await.unwrap();

        mock.assert();
        assert_eq!(thresholds.medium_threshold, 0);
        assert_eq!(thresholds.signers.len(), 1);
        assert_eq!(thresholds.signers[0].key, account);
    }
}
