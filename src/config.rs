//! Configuration surface, per `spec.md` §6.3. Loaded with the `config`
//! crate the same way the teacher loads `Config::load()`: defaults, then
//! an optional `config/*.toml`, then `ANCHOR_`-prefixed environment
//! variables. Validated eagerly — the process must not begin accepting
//! requests until validation passes.

use serde::Deserialize;
use stellar_base::crypto::KeyPair;
use std::collections::HashMap;

use crate::models::AssetConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Public,
    Mainnet,
    Testnet,
    Futurenet,
    Standalone,
}

impl Network {
    /// `public` and `mainnet` both select the production passphrase.
    pub fn passphrase(self) -> &'static str {
        match self {
            Network::Public | Network::Mainnet => "Public Global Stellar Network ; September 2015",
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Futurenet => "Test SDF Future Network ; October 2022",
            Network::Standalone => "Standalone Network ; February 2017",
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Network::Public | Network::Mainnet)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind_address: String,
}

fn default_port() -> u16 {
    8080
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_jwt_hours")]
    pub expiration_hours: i64,
}

fn default_jwt_hours() -> i64 {
    24
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrgDocumentation {
    pub org_name: Option<String>,
    pub org_url: Option<String>,
    pub org_description: Option<String>,
    pub org_logo: Option<String>,
    pub org_physical_address: Option<String>,
    pub org_official_email: Option<String>,
    pub org_support_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MountConfig {
    #[serde(default = "default_true")]
    pub sep10: bool,
    #[serde(default = "default_true")]
    pub sep24: bool,
    #[serde(default = "default_true")]
    pub sep6: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            sep10: true,
            sep24: true,
            sep6: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sep24Config {
    /// Base URL of the operator's interactive (KYC/bank-details) page.
    pub interactive_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub json_format: bool,
    pub log_filter: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            log_filter: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub domain: String,
    pub secret_key: String,
    pub network: Network,
    pub jwt: JwtConfig,
    pub assets: HashMap<String, AssetConfig>,
    #[serde(default)]
    pub meta: Option<OrgDocumentation>,
    #[serde(default)]
    pub server: ServerConfigOrDefault,
    #[serde(default)]
    pub mounts: MountConfig,
    pub sep24: Option<Sep24Config>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Horizon base URL for signer/threshold lookups (`spec.md` §4.2 step 5).
    /// Defaults to the public instance matching `network`.
    pub horizon_url: Option<String>,
}

impl Config {
    /// The Horizon instance to query for account signers/thresholds.
    pub fn horizon_url(&self) -> String {
        self.horizon_url.clone().unwrap_or_else(|| {
            if self.network.is_production() {
                "https://horizon.stellar.org".to_string()
            } else {
                "https://horizon-testnet.stellar.org".to_string()
            }
        })
    }
}

/// Wrapper so `ServerConfig` can have a zero-config default while still
/// being `#[serde(default)]`-able without requiring `Default` on every
/// nested field manually.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ServerConfigOrDefault(pub ServerConfig);

impl Default for ServerConfigOrDefault {
    fn default() -> Self {
        Self(ServerConfig {
            port: default_port(),
            bind_address: default_bind(),
        })
    }
}

impl std::ops::Deref for ServerConfigOrDefault {
    type Target = ServerConfig;
    fn deref(&self) -> &ServerConfig {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from defaults, an optional `config/default.toml`,
    /// and `ANCHOR_`-prefixed environment variables, then validate it.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("ANCHOR")
                    .separator("__")
                    .try_parsing(true),
            );

        let raw = builder.build()?;
        let cfg: Config = raw.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::Invalid("domain must not be empty".into()));
        }

        KeyPair::from_secret_seed(&self.secret_key)
            .map_err(|_| ConfigError::Invalid("secret_key is not a valid Stellar secret".into()))?;

        if self.jwt.secret.as_bytes().len() < 32 {
            return Err(ConfigError::Invalid(
                "jwt_secret must be at least 32 octets".into(),
            ));
        }

        if self.assets.is_empty() {
            return Err(ConfigError::Invalid("assets must not be empty".into()));
        }

        if self.mounts.sep24 && self.sep24.is_none() {
            return Err(ConfigError::Invalid(
                "sep24.interactive_url is required when SEP-24 is mounted".into(),
            ));
        }
        if let Some(sep24) = &self.sep24 {
            if sep24.interactive_url.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "sep24.interactive_url must not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    /// The operator's signing keypair, derived from `secret_key`.
    pub fn signing_keypair(&self) -> KeyPair {
        KeyPair::from_secret_seed(&self.secret_key).expect("validated at load()")
    }

    /// Scheme for URLs on this anchor's own domain, per `spec.md` §4.1.
    pub fn url_scheme(&self) -> &'static str {
        url_scheme_for(&self.domain)
    }
}

/// `localhost`/`127.0.0.1` hosts use plain HTTP; everything else uses HTTPS.
pub fn url_scheme_for(host: &str) -> &'static str {
    if host.starts_with("localhost") || host.starts_with("127.0.0.1") {
        "http"
    } else {
        "https"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_scheme_localhost_is_insecure() {
        assert_eq!(url_scheme_for("localhost:8080"), "http");
        assert_eq!(url_scheme_for("127.0.0.1"), "http");
        assert_eq!(url_scheme_for("anchor.example.com"), "https");
    }

    #[test]
    fn production_networks_select_production_passphrase() {
        assert!(Network::Public.is_production());
        assert!(Network::Mainnet.is_production());
        assert!(!Network::Testnet.is_production());
        assert_eq!(
            Network::Public.passphrase(),
            Network::Mainnet.passphrase()
        );
    }

    fn base_config(jwt_secret: &str) -> Config {
        let mut assets = HashMap::new();
        assets.insert(
            "USDC".to_string(),
            AssetConfig {
                code: "USDC".to_string(),
                issuer: None,
                display_name: None,
                description: None,
                display_decimals: 7,
                status: None,
                deposit: Default::default(),
                withdraw: Default::default(),
            },
        );
        Config {
            domain: "anchor.example.com".to_string(),
            secret_key: "SCZ47IF6SNCYNCNK3QDNO663UFFUGQN4RI2V2RR7SCSR4VC53CPVYDRT".to_string(),
            network: Network::Testnet,
            jwt: JwtConfig {
                secret: jwt_secret.to_string(),
                expiration_hours: 24,
            },
            assets,
            meta: None,
            server: ServerConfigOrDefault::default(),
            mounts: MountConfig::default(),
            sep24: Some(Sep24Config {
                interactive_url: "https://kyc.example.com".to_string(),
            }),
            telemetry: TelemetryConfig::default(),
            horizon_url: None,
        }
    }

    /// `spec.md` §8, boundary behaviors: 31 octets fails, 32 succeeds.
    #[test]
    fn jwt_secret_31_octets_fails_32_succeeds() {
        let thirty_one = "a".repeat(31);
        let thirty_two = "a".repeat(32);

        assert!(base_config(&thirty_one).validate().is_err());
        assert!(base_config(&thirty_two).validate().is_ok());
    }

    #[test]
    fn empty_domain_fails_validation() {
        let mut config = base_config(&"a".repeat(32));
        config.domain = "".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_assets_fails_validation() {
        let mut config = base_config(&"a".repeat(32));
        config.assets.clear();
        assert!(config.validate().is_err());
    }
}
