//! The OpenClaw configuration document (`openclaw.json` and per-agent
//! `models.json` catalogs).
//!
//! The document is kept as an untyped JSON tree so that every key this crate
//! does not know about survives a read-modify-write cycle, in its original
//! order. Reconciliation code works on a [`Document`] value in memory;
//! loading and saving are separate steps.

use std::path::Path;

use {
    serde::Serialize,
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::error::{Error, Result};

/// An in-memory configuration document. The root is always a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    /// Read and parse a document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingDocument {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded document");
        Self::from_value(value).map_err(|e| e.at_path(path))
    }

    /// Wrap an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(Error::malformed(&["<root>"], "an object")),
        }
    }

    /// Write the whole document: two-space indentation, non-ASCII characters
    /// escaped, trailing newline.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render()?)?;
        debug!(path = %path.display(), "saved document");
        Ok(())
    }

    /// The exact bytes [`Document::save`] writes.
    pub fn render(&self) -> Result<String> {
        let mut out = to_ascii_json(&self.root)?;
        out.push('\n');
        Ok(out)
    }

    /// Look up a value by key path without creating anything.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.root.get(*first)?, |value, key| value.get(*key))
    }

    /// Return the object at `path`, creating empty objects for every missing
    /// segment. Fails if an existing segment is not an object.
    pub fn object_at_mut(&mut self, path: &[&str]) -> Result<&mut Map<String, Value>> {
        let mut current = &mut self.root;
        for (depth, key) in path.iter().enumerate() {
            current = current
                .entry(*key)
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()
                .ok_or_else(|| Error::malformed(&path[..=depth], "an object"))?;
        }
        Ok(current)
    }

    /// Return the array at `path`, creating it (and missing parents) when
    /// absent.
    pub fn array_at_mut(&mut self, path: &[&str]) -> Result<&mut Vec<Value>> {
        let Some((last, parent)) = path.split_last() else {
            return Err(Error::malformed(&["<root>"], "an array"));
        };
        self.object_at_mut(parent)?
            .entry(*last)
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .ok_or_else(|| Error::malformed(path, "an array"))
    }

    /// Find an agent record in `agents.list` by id.
    pub fn find_agent(&self, agent_id: &str) -> Option<&Map<String, Value>> {
        self.get(&["agents", "list"])?
            .as_array()?
            .iter()
            .filter_map(Value::as_object)
            .find(|agent| id_matches(agent.get("id"), agent_id))
    }

    /// `agents.defaults.model.primary`, if set.
    pub fn default_model(&self) -> Option<&str> {
        self.get(&["agents", "defaults", "model", "primary"])?
            .as_str()
    }

    /// A Telegram account record from `channels.telegram.accounts`.
    pub fn telegram_account(&self, account_id: &str) -> Option<&Map<String, Value>> {
        self.get(&["channels", "telegram", "accounts", account_id])?
            .as_object()
    }

    /// The `bindings` list, or an empty slice when absent.
    pub fn bindings(&self) -> &[Value] {
        self.get(&["bindings"])
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Pretty-print `value` with two-space indentation and every non-ASCII
/// character escaped, the format OpenClaw's own tooling writes.
pub fn to_ascii_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let pretty = serde_json::to_string_pretty(value)?;
    Ok(escape_non_ascii(&pretty))
}

/// Compare an agent `id` field against a wanted id. Numeric ids compare by
/// their textual form.
pub(crate) fn id_matches(id: Option<&Value>, wanted: &str) -> bool {
    match id {
        Some(Value::String(id)) => id == wanted,
        Some(Value::Number(id)) => id.to_string() == wanted,
        _ => false,
    }
}

/// Escape every non-ASCII character as `\uXXXX` (UTF-16 code units, so
/// characters outside the BMP become surrogate pairs).
///
/// Only valid on serialized JSON: non-ASCII can only occur inside string
/// literals there, where `\u` escapes are always legal.
fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        for unit in ch.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{unit:04x}"));
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, serde_json::json};

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn load_missing_file_is_missing_document() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Document::load(&tmp.path().join("openclaw.json")).unwrap_err();
        assert!(matches!(err, Error::MissingDocument { .. }));
    }

    #[test]
    fn load_invalid_json_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("openclaw.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Document::load(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("openclaw.json"));
    }

    #[test]
    fn load_rejects_non_object_root() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("openclaw.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = Document::load(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { path: Some(_), .. }));
    }

    #[test]
    fn object_at_mut_creates_missing_sections() {
        let mut d = doc(json!({"gateway": {"port": 18789}}));
        d.object_at_mut(&["agents", "defaults", "model"])
            .unwrap()
            .insert("primary".into(), json!("m1"));

        assert_eq!(d.default_model(), Some("m1"));
        assert_eq!(d.get(&["gateway", "port"]), Some(&json!(18789)));
    }

    #[test]
    fn object_at_mut_rejects_wrong_type() {
        let mut d = doc(json!({"channels": {"telegram": "disabled"}}));
        let err = d.object_at_mut(&["channels", "telegram", "accounts"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected `channels.telegram` to be an object"
        );
    }

    #[test]
    fn array_at_mut_creates_and_validates() {
        let mut d = doc(json!({}));
        d.array_at_mut(&["bindings"]).unwrap().push(json!({"agentId": "a"}));
        assert_eq!(d.bindings().len(), 1);

        let mut d = doc(json!({"bindings": {}}));
        assert!(d.array_at_mut(&["bindings"]).is_err());
    }

    #[test]
    fn find_agent_matches_string_and_numeric_ids() {
        let d = doc(json!({"agents": {"list": [
            {"id": "ops", "name": "Ops"},
            {"id": 7, "name": "Seven"},
            "garbage"
        ]}}));
        assert_eq!(d.find_agent("ops").unwrap()["name"], "Ops");
        assert_eq!(d.find_agent("7").unwrap()["name"], "Seven");
        assert!(d.find_agent("missing").is_none());
    }

    #[test]
    fn render_escapes_non_ascii_and_keeps_order() {
        let d = doc(json!({"zeta": "Café 🦀", "alpha": [], "mid": {}}));
        let rendered = d.render().unwrap();

        assert!(rendered.ends_with("}\n"));
        assert!(rendered.is_ascii());
        assert!(rendered.contains(r#""Caf\u00e9 \ud83e\udd80""#));
        let zeta = rendered.find("zeta").unwrap();
        let alpha = rendered.find("alpha").unwrap();
        assert!(zeta < alpha, "insertion order must be preserved");
    }

    #[test]
    fn save_then_load_round_trips_unicode() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("openclaw.json");
        let original = doc(json!({"agents": {"list": [{"id": "ops", "name": "Équipe"}]}}));

        original.save(&path).unwrap();
        let loaded = Document::load(&path).unwrap();

        assert_eq!(loaded, original);
        assert!(std::fs::read_to_string(&path).unwrap().contains("  \"agents\""));
    }
}
