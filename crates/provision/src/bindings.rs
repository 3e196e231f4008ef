//! Routing bindings (`bindings[]`).
//!
//! A binding maps an inbound `(channel, accountId)` pair to the agent that
//! handles it. Reconciliation keeps the list unambiguous: after installing a
//! binding, no other binding on the same channel references the same
//! account or the same agent, and when the main agent is provisioned no
//! other binding on that channel points at `main`.

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::debug,
};

use crate::{
    document::Document,
    error::{Error, Result},
    ids::MAIN_AGENT_ID,
};

/// A single routing binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(rename = "agentId")]
    pub agent_id: String,
    #[serde(rename = "match")]
    pub route: BindingMatch,
}

/// The inbound side of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingMatch {
    pub channel: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
}

impl Binding {
    pub fn new(
        agent_id: impl Into<String>,
        channel: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            route: BindingMatch {
                channel: channel.into(),
                account_id: account_id.into(),
            },
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "agentId": self.agent_id,
            "match": {
                "channel": self.route.channel,
                "accountId": self.route.account_id,
            },
        })
    }
}

/// Decides which existing bindings conflict with a desired one.
#[derive(Debug, Clone, Copy)]
pub struct BindingExclusion<'a> {
    desired: &'a Binding,
    is_main: bool,
}

impl<'a> BindingExclusion<'a> {
    pub fn new(desired: &'a Binding, is_main: bool) -> Self {
        Self { desired, is_main }
    }

    /// Whether `existing` must be dropped before `desired` is installed.
    ///
    /// Bindings on other channels, and entries whose shape cannot be read,
    /// are never excluded.
    pub fn excludes(&self, existing: &Value) -> bool {
        let Some(route) = existing.get("match") else {
            return false;
        };
        if route.get("channel").and_then(Value::as_str) != Some(self.desired.route.channel.as_str()) {
            return false;
        }
        let agent_id = existing.get("agentId").and_then(Value::as_str);
        let account_id = route.get("accountId").and_then(Value::as_str);

        (self.is_main && agent_id == Some(MAIN_AGENT_ID))
            || account_id == Some(self.desired.route.account_id.as_str())
            || agent_id == Some(self.desired.agent_id.as_str())
    }
}

/// Rebuild a bindings list: keep every entry the exclusion predicate allows,
/// in order, then append `desired`.
pub fn reconcile_bindings(existing: Vec<Value>, desired: &Binding, is_main: bool) -> Vec<Value> {
    let exclusion = BindingExclusion::new(desired, is_main);
    let before = existing.len();
    let mut kept: Vec<Value> = existing
        .into_iter()
        .filter(|binding| !exclusion.excludes(binding))
        .collect();
    debug!(
        agent_id = %desired.agent_id,
        account_id = %desired.route.account_id,
        dropped = before - kept.len(),
        "reconciled bindings"
    );
    kept.push(desired.to_value());
    kept
}

/// Apply [`reconcile_bindings`] to the document's `bindings` list.
pub fn install_binding(document: &mut Document, desired: &Binding, is_main: bool) -> Result<()> {
    let bindings = document.array_at_mut(&["bindings"])?;
    let existing = std::mem::take(bindings);
    *bindings = reconcile_bindings(existing, desired, is_main);
    Ok(())
}

/// Parse the typed bindings out of a document, skipping entries that do not
/// have the expected shape.
pub fn typed_bindings(document: &Document) -> Vec<Binding> {
    document
        .bindings()
        .iter()
        .filter_map(|value| serde_json::from_value(value.clone()).ok())
        .collect()
}

/// Check the routing invariant on one channel: at most one binding per
/// account id.
pub fn ensure_unambiguous(document: &Document, channel: &str) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for binding in typed_bindings(document) {
        if binding.route.channel == channel && !seen.insert(binding.route.account_id.clone()) {
            return Err(Error::message(format!(
                "account '{}' on channel '{channel}' has more than one binding",
                binding.route.account_id
            )));
        }
    }
    Ok(())
}
