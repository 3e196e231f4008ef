//! The `antigravity` model provider block and its model entries.
//!
//! The block lives under `models.providers` in `openclaw.json` and under
//! `providers` in each agent's `models.json`. It is always replaced as a
//! whole; fields are never merged.

use std::path::Path;

use {
    secrecy::{ExposeSecret, Secret},
    serde::Serialize,
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::error::Result;

pub const PROVIDER_NAME: &str = "antigravity";
pub const PROVIDER_API: &str = "openai-completions";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8045/v1";

/// Models published when the caller does not pick any.
pub const DEFAULT_MODELS: &[&str] = &[
    "gemini-3-pro-high",
    "gemini-3-pro-low",
    "gemini-3-flash",
    "gemini-2.5-flash-thinking",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "claude-sonnet-4-6",
    "claude-opus-4-6-thinking",
];

/// Models with this prefix accept images and have the smaller window.
const IMAGE_CAPABLE_PREFIX: &str = "claude-";
const IMAGE_CONTEXT_WINDOW: u64 = 200_000;
const TEXT_CONTEXT_WINDOW: u64 = 1_048_576;
const MAX_OUTPUT_TOKENS: u64 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
}

/// Per-token pricing. Everything served through the proxy is free.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCost {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
}

/// One model's capability descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    pub api: String,
    pub reasoning: bool,
    pub input: Vec<Modality>,
    pub cost: ModelCost,
    pub context_window: u64,
    pub max_tokens: u64,
}

impl ModelEntry {
    /// Build the entry for a model id. Pure and deterministic.
    pub fn for_model(model_id: &str) -> Self {
        let image_capable = model_id.starts_with(IMAGE_CAPABLE_PREFIX);
        let (input, context_window) = if image_capable {
            (vec![Modality::Text, Modality::Image], IMAGE_CONTEXT_WINDOW)
        } else {
            (vec![Modality::Text], TEXT_CONTEXT_WINDOW)
        };
        Self {
            id: model_id.to_string(),
            name: model_id.to_string(),
            api: PROVIDER_API.to_string(),
            reasoning: true,
            input,
            cost: ModelCost::default(),
            context_window,
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

/// The full provider block as written to disk.
#[derive(Clone)]
pub struct ProviderBlock {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub models: Vec<ModelEntry>,
}

impl std::fmt::Debug for ProviderBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBlock")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("models", &self.models.len())
            .finish()
    }
}

impl ProviderBlock {
    pub fn new(base_url: impl Into<String>, api_key: Secret<String>, model_ids: &[String]) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            models: model_ids.iter().map(|id| ModelEntry::for_model(id)).collect(),
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        let models = serde_json::to_value(&self.models)?;
        Ok(serde_json::json!({
            "baseUrl": self.base_url,
            "apiKey": self.api_key.expose_secret(),
            "api": PROVIDER_API,
            "models": models,
        }))
    }
}

/// Serialize with object keys sorted at every level, so that two values
/// compare equal exactly when their canonical strings do.
pub fn canonical_json(value: &Value) -> String {
    fn sorted(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut out = Map::new();
                for key in keys {
                    out.insert(key.clone(), sorted(&map[key]));
                }
                Value::Object(out)
            },
            Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
            other => other.clone(),
        }
    }
    sorted(value).to_string()
}

/// Replace the provider block inside a `providers` map. Returns whether the
/// canonical form changed; a missing block counts as `{}`.
pub fn upsert_provider(providers: &mut Map<String, Value>, block: &ProviderBlock) -> Result<bool> {
    let empty = Value::Object(Map::new());
    let before = canonical_json(providers.get(PROVIDER_NAME).unwrap_or(&empty));
    let desired = block.to_value()?;
    let after = canonical_json(&desired);
    providers.insert(PROVIDER_NAME.to_string(), desired);
    Ok(before != after)
}

/// Give a freshly provisioned agent a copy of the main agent's model
/// catalog. Does nothing when the main catalog is missing or `dest` is the
/// main catalog itself.
pub fn seed_agent_catalog(main_catalog: &Path, dest: &Path) -> Result<bool> {
    if !main_catalog.is_file() {
        return Ok(false);
    }
    if same_file(main_catalog, dest) {
        return Ok(false);
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(main_catalog, dest)?;
    debug!(src = %main_catalog.display(), dest = %dest.display(), "seeded agent model catalog");
    Ok(true)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    fn block(models: &[&str]) -> ProviderBlock {
        let ids: Vec<String> = models.iter().map(|m| m.to_string()).collect();
        ProviderBlock::new(DEFAULT_BASE_URL, Secret::new("sk-test".into()), &ids)
    }

    #[rstest]
    #[case("claude-opus-4-6-thinking", vec![Modality::Text, Modality::Image], 200_000)]
    #[case("claude-sonnet-4-6", vec![Modality::Text, Modality::Image], 200_000)]
    #[case("gemini-3-pro-high", vec![Modality::Text], 1_048_576)]
    #[case("gemini-2.5-flash-lite", vec![Modality::Text], 1_048_576)]
    #[case("anthropic/claude-opus-4-6", vec![Modality::Text], 1_048_576)]
    fn model_entry_capabilities(
        #[case] id: &str,
        #[case] input: Vec<Modality>,
        #[case] context_window: u64,
    ) {
        let entry = ModelEntry::for_model(id);
        assert_eq!(entry.input, input);
        assert_eq!(entry.context_window, context_window);
        assert_eq!(entry.max_tokens, 8192);
        assert_eq!(entry.cost, ModelCost::default());
        assert!(entry.reasoning);
        assert_eq!(entry.name, id);
    }

    #[test]
    fn model_entry_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(ModelEntry::for_model("claude-opus-4-6-thinking")).unwrap();
        assert_eq!(value, json!({
            "id": "claude-opus-4-6-thinking",
            "name": "claude-opus-4-6-thinking",
            "api": "openai-completions",
            "reasoning": true,
            "input": ["text", "image"],
            "cost": {"input": 0, "output": 0, "cacheRead": 0, "cacheWrite": 0},
            "contextWindow": 200000,
            "maxTokens": 8192
        }));
    }

    #[test]
    fn canonical_json_ignores_key_order() {
        let a = json!({"b": 1, "a": {"y": [1, {"d": 1, "c": 2}], "x": null}});
        let b = json!({"a": {"x": null, "y": [1, {"c": 2, "d": 1}]}, "b": 1});
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_ne!(canonical_json(&json!([1, 2])), canonical_json(&json!([2, 1])));
    }

    #[test]
    fn upsert_reports_change_only_once() {
        let mut providers = Map::new();
        providers.insert("openai".into(), json!({"apiKey": "keep"}));

        assert!(upsert_provider(&mut providers, &block(&["gemini-3-flash"])).unwrap());
        assert!(!upsert_provider(&mut providers, &block(&["gemini-3-flash"])).unwrap());
        assert!(upsert_provider(&mut providers, &block(&["gemini-3-flash", "claude-sonnet-4-6"])).unwrap());
        assert_eq!(providers["openai"], json!({"apiKey": "keep"}));
    }

    #[test]
    fn upsert_replaces_instead_of_merging() {
        let mut providers = Map::new();
        providers.insert(
            PROVIDER_NAME.into(),
            json!({"baseUrl": "http://old", "headers": {"x": "y"}}),
        );

        assert!(upsert_provider(&mut providers, &block(&[])).unwrap());
        let stored = providers[PROVIDER_NAME].as_object().unwrap();
        assert!(!stored.contains_key("headers"));
        assert_eq!(stored["apiKey"], "sk-test");
        assert_eq!(stored["models"], json!([]));
    }

    #[test]
    fn reordered_existing_block_is_not_a_change() {
        let mut providers = Map::new();
        let desired = block(&["gemini-3-flash"]).to_value().unwrap();
        let mut reordered = Map::new();
        for (key, value) in desired.as_object().unwrap().iter().rev() {
            reordered.insert(key.clone(), value.clone());
        }
        providers.insert(PROVIDER_NAME.into(), Value::Object(reordered));

        assert!(!upsert_provider(&mut providers, &block(&["gemini-3-flash"])).unwrap());
    }

    #[test]
    fn seed_copies_main_catalog_once() {
        let tmp = tempfile::tempdir().unwrap();
        let main = tmp.path().join("agents/main/agent/models.json");
        let dest = tmp.path().join("agents/ops/agent/models.json");
        std::fs::create_dir_all(main.parent().unwrap()).unwrap();
        std::fs::write(&main, r#"{"providers":{}}"#).unwrap();

        assert!(seed_agent_catalog(&main, &dest).unwrap());
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), r#"{"providers":{}}"#);
        assert!(!seed_agent_catalog(&main, &main).unwrap());
    }

    #[test]
    fn seed_without_main_catalog_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("agents/ops/agent/models.json");
        assert!(!seed_agent_catalog(&tmp.path().join("missing.json"), &dest).unwrap());
        assert!(!dest.exists());
    }
}
