//! Telegram channel accounts in `channels.telegram.accounts`.

use {
    secrecy::{ExposeSecret, Secret},
    serde_json::{Value, json},
    tracing::debug,
};

use crate::{
    document::Document,
    error::{Error, Result},
};

/// Channel name used for every account and binding this crate manages.
pub const TELEGRAM_CHANNEL: &str = "telegram";

const ACCOUNTS: &[&str] = &["channels", TELEGRAM_CHANNEL, "accounts"];
const DEFAULT_GROUP_POLICY: &str = "allowlist";
const DEFAULT_STREAM_MODE: &str = "partial";

/// DM access policy written to the account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DmPolicy {
    /// Anyone can DM the bot; `allowFrom` is forced to `["*"]`.
    #[default]
    Open,
    /// Unknown senders must pair first; `allowFrom` is left alone.
    Pairing,
}

impl DmPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Pairing => "pairing",
        }
    }
}

impl std::fmt::Display for DmPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DmPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(Self::Open),
            "pairing" => Ok(Self::Pairing),
            other => Err(Error::message(format!(
                "unknown dm policy: '{other}' (expected open or pairing)"
            ))),
        }
    }
}

/// Desired state of one Telegram account.
#[derive(Clone)]
pub struct AccountSpec {
    pub name: String,
    pub token: Secret<String>,
    pub dm_policy: DmPolicy,
}

impl std::fmt::Debug for AccountSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSpec")
            .field("name", &self.name)
            .field("token", &"[REDACTED]")
            .field("dm_policy", &self.dm_policy)
            .finish()
    }
}

/// Insert or update the Telegram account `account_id`.
///
/// Identity fields (`name`, `enabled`, `botToken`, `dmPolicy`) always take
/// the desired value; `groupPolicy` and `streamMode` only get defaults when
/// absent.
pub fn upsert_account(document: &mut Document, account_id: &str, spec: &AccountSpec) -> Result<()> {
    let accounts = document.object_at_mut(ACCOUNTS)?;
    if !accounts.contains_key(account_id) {
        debug!(account_id, "adding telegram account");
    }
    let account = accounts
        .entry(account_id)
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or_else(|| Error::malformed(&[ACCOUNTS, &[account_id][..]].concat(), "an object"))?;

    account.insert("name".into(), Value::String(spec.name.clone()));
    account.insert("enabled".into(), Value::Bool(true));
    account.insert(
        "botToken".into(),
        Value::String(spec.token.expose_secret().clone()),
    );
    account.insert(
        "dmPolicy".into(),
        Value::String(spec.dm_policy.as_str().to_string()),
    );
    account
        .entry("groupPolicy")
        .or_insert_with(|| Value::String(DEFAULT_GROUP_POLICY.into()));
    account
        .entry("streamMode")
        .or_insert_with(|| Value::String(DEFAULT_STREAM_MODE.into()));
    if spec.dm_policy == DmPolicy::Open {
        account.insert("allowFrom".into(), json!(["*"]));
    }
    Ok(())
}
