//! Agent records in `agents.list`.

use {
    serde_json::{Map, Value, json},
    tracing::debug,
};

use crate::{
    document::{Document, id_matches},
    error::{Error, Result},
};

const AGENT_LIST: &[&str] = &["agents", "list"];
const DEFAULT_MODEL: &[&str] = &["agents", "defaults", "model"];

/// Desired state of one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub id: String,
    pub name: String,
    pub workspace: String,
    pub agent_dir: String,
    pub model: String,
}

/// Insert or update the agent described by `spec`.
///
/// `name` and `model` always take the desired value. `workspace` and
/// `agentDir` are only filled in when missing so that a hand-edited location
/// is never moved.
pub fn upsert_agent(document: &mut Document, spec: &AgentSpec) -> Result<()> {
    let list = document.array_at_mut(AGENT_LIST)?;
    let position = list
        .iter()
        .position(|item| id_matches(item.get("id"), &spec.id));

    let agent = match position {
        Some(index) => {
            debug!(agent_id = %spec.id, "updating existing agent");
            &mut list[index]
        },
        None => {
            debug!(agent_id = %spec.id, "adding agent record");
            list.push(json!({
                "id": spec.id,
                "name": spec.name,
                "workspace": spec.workspace,
                "agentDir": spec.agent_dir,
                "model": spec.model,
            }));
            let last = list.len() - 1;
            &mut list[last]
        },
    };
    let agent: &mut Map<String, Value> = agent
        .as_object_mut()
        .ok_or_else(|| Error::malformed(AGENT_LIST, "a list of objects"))?;

    agent.insert("name".into(), Value::String(spec.name.clone()));
    agent.insert("model".into(), Value::String(spec.model.clone()));
    agent
        .entry("workspace")
        .or_insert_with(|| Value::String(spec.workspace.clone()));
    agent
        .entry("agentDir")
        .or_insert_with(|| Value::String(spec.agent_dir.clone()));
    Ok(())
}

/// Point `agents.defaults.model.primary` at `model`.
pub fn set_default_model(document: &mut Document, model: &str) -> Result<()> {
    document
        .object_at_mut(DEFAULT_MODEL)?
        .insert("primary".into(), Value::String(model.to_string()));
    Ok(())
}
