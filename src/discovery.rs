//! SEP-1 discovery document rendering (`spec.md` §4.1). Builds the
//! `stellar.toml` body from the operator's `Config`. Cached by the caller
//! (see `service::ServiceContainer::discovery_document`) and invalidated
//! whenever the mount set or config changes — in practice that only
//! happens at process start, since config is immutable for the life of
//! the process.

use std::fmt::Write as _;

use crate::config::{Config, Network};
use crate::models::AssetStatus;

/// Render the full `stellar.toml` document for `config`.
pub fn render(config: &Config) -> String {
    let mut out = String::new();

    writeln!(out, "VERSION = \"2.0.0\"").ok();
    writeln!(out, "NETWORK_PASSPHRASE = \"{}\"", config.network.passphrase()).ok();
    writeln!(
        out,
        "SIGNING_KEY = \"{}\"",
        config.signing_keypair().public_key().account_id()
    )
    .ok();

    let scheme = config.url_scheme();
    if config.mounts.sep10 {
        writeln!(out, "WEB_AUTH_ENDPOINT = \"{}://{}/auth\"", scheme, config.domain).ok();
    }
    if config.mounts.sep24 {
        writeln!(
            out,
            "TRANSFER_SERVER_SEP0024 = \"{}://{}/sep24\"",
            scheme, config.domain
        )
        .ok();
    }
    if config.mounts.sep6 {
        writeln!(out, "TRANSFER_SERVER = \"{}://{}/sep6\"", scheme, config.domain).ok();
    }

    if let Some(meta) = &config.meta {
        out.push('\n');
        writeln!(out, "[DOCUMENTATION]").ok();
        if let Some(v) = &meta.org_name {
            writeln!(out, "ORG_NAME = \"{}\"", escape(v)).ok();
        }
        if let Some(v) = &meta.org_url {
            writeln!(out, "ORG_URL = \"{}\"", escape(v)).ok();
        }
        if let Some(v) = &meta.org_description {
            writeln!(out, "ORG_DESCRIPTION = \"{}\"", escape(v)).ok();
        }
        if let Some(v) = &meta.org_logo {
            writeln!(out, "ORG_LOGO = \"{}\"", escape(v)).ok();
        }
        if let Some(v) = &meta.org_physical_address {
            writeln!(out, "ORG_PHYSICAL_ADDRESS = \"{}\"", escape(v)).ok();
        }
        if let Some(v) = &meta.org_official_email {
            writeln!(out, "ORG_OFFICIAL_EMAIL = \"{}\"", escape(v)).ok();
        }
        if let Some(v) = &meta.org_support_email {
            writeln!(out, "ORG_SUPPORT_EMAIL = \"{}\"", escape(v)).ok();
        }
    }

    let mut assets: Vec<_> = config.assets.values().collect();
    assets.sort_by(|a, b| a.code.cmp(&b.code));

    for asset in assets {
        out.push('\n');
        writeln!(out, "[[CURRENCIES]]").ok();

        if asset.is_native() {
            writeln!(out, "code = \"native\"").ok();
        } else {
            writeln!(out, "code = \"{}\"", escape(&asset.code)).ok();
            if let Some(issuer) = &asset.issuer {
                writeln!(out, "issuer = \"{}\"", escape(issuer)).ok();
            }
        }

        if let Some(status) = resolved_status(asset.status, config.network.is_production()) {
            writeln!(out, "status = \"{}\"", status_label(status)).ok();
        }
        writeln!(out, "display_decimals = {}", asset.display_decimals).ok();

        if let Some(name) = &asset.display_name {
            writeln!(out, "name = \"{}\"", escape(name)).ok();
        }
        if let Some(desc) = &asset.description {
            writeln!(out, "desc = \"{}\"", escape(desc)).ok();
        }
    }

    out
}

/// Per `spec.md` §4.1 "Status derivation per asset": explicit `live`/`test`
/// is emitted as-is, explicit `dead`/`private` is omitted entirely, and an
/// unset status defaults to `test` off the production network or `live` on
/// it.
fn resolved_status(configured: Option<AssetStatus>, is_production: bool) -> Option<AssetStatus> {
    match configured {
        Some(AssetStatus::Live) => Some(AssetStatus::Live),
        Some(AssetStatus::Test) => Some(AssetStatus::Test),
        Some(AssetStatus::Dead) | Some(AssetStatus::Private) => None,
        None => Some(if is_production {
            AssetStatus::Live
        } else {
            AssetStatus::Test
        }),
    }
}

fn status_label(status: AssetStatus) -> &'static str {
    match status {
        AssetStatus::Live => "live",
        AssetStatus::Test => "test",
        AssetStatus::Dead => "dead",
        AssetStatus::Private => "private",
    }
}

/// TOML basic strings: backslash-escape `\`, `"`, newline, carriage return
/// and tab (`spec.md` §4.1 "String encoding"); other control characters are
/// stripped rather than left unescaped and producing invalid TOML.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

pub fn network_passphrase_for(network: Network) -> &'static str {
    network.passphrase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape(r#"a "quoted" \ value"#), r#"a \"quoted\" \\ value"#);
    }

    #[test]
    fn escapes_newline_carriage_return_and_tab() {
        assert_eq!(escape("line\nbreak"), "line\\nbreak");
        assert_eq!(escape("a\rb\tc"), "a\\rb\\tc");
    }

    #[test]
    fn strips_other_control_characters() {
        assert_eq!(escape("a\u{0007}b"), "ab");
    }

    #[test]
    fn status_omitted_for_dead_and_private() {
        assert_eq!(resolved_status(Some(AssetStatus::Dead), true), None);
        assert_eq!(resolved_status(Some(AssetStatus::Private), false), None);
    }

    #[test]
    fn status_defaults_by_network() {
        assert_eq!(resolved_status(None, true), Some(AssetStatus::Live));
        assert_eq!(resolved_status(None, false), Some(AssetStatus::Test));
    }
}
