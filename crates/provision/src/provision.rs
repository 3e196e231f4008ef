//! Provision one Telegram bot: channel account, agent, and routing binding.

use std::path::PathBuf;

use {
    secrecy::Secret,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::{debug, info},
};

use crate::{
    accounts::{AccountSpec, DmPolicy, TELEGRAM_CHANNEL, upsert_account},
    agents::{AgentSpec, set_default_model, upsert_agent},
    bindings::{Binding, ensure_unambiguous, install_binding},
    catalog::seed_agent_catalog,
    document::Document,
    error::{Error, Result},
    home::OpenClawHome,
    ids::{MAIN_AGENT_ID, derive_account_id, derive_agent_id},
    runner::{CommandRunner, OpenClawCommand},
};

/// Message sent to the agent to check that the new route answers.
pub const DEFAULT_VERIFY_MESSAGE: &str = "reply only: ok";

/// Everything the operator asked for.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    /// Display name of the bot and agent.
    pub name: String,
    /// Telegram username, e.g. `@canyonMain_bot`.
    pub username: String,
    pub token: Secret<String>,
    /// Model for the agent, e.g. `antigravity/gemini-3-pro-low`.
    pub model: String,
    /// Provision the default `main` agent instead of a dedicated one.
    pub is_main: bool,
    pub agent_id: Option<String>,
    pub account_id: Option<String>,
    pub dm_policy: DmPolicy,
    pub skip_restart: bool,
    pub skip_verify: bool,
    pub verify_message: String,
    /// Decide everything, run and write nothing.
    pub dry_run: bool,
}

impl ProvisionRequest {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        token: Secret<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            token,
            model: model.into(),
            is_main: false,
            agent_id: None,
            account_id: None,
            dm_policy: DmPolicy::default(),
            skip_restart: false,
            skip_verify: false,
            verify_message: DEFAULT_VERIFY_MESSAGE.to_string(),
            dry_run: false,
        }
    }
}

/// Identifiers and paths derived from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub account_id: String,
    pub agent_id: String,
    pub workspace: PathBuf,
    pub agent_dir: PathBuf,
}

impl ProvisionPlan {
    pub fn new(home: &OpenClawHome, request: &ProvisionRequest) -> Self {
        let account_id = match request.account_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => derive_account_id(&request.username, &request.name),
        };
        let agent_id = derive_agent_id(
            request.is_main,
            request.agent_id.as_deref(),
            &request.name,
        );
        let is_main_agent = agent_id == MAIN_AGENT_ID;
        Self {
            workspace: home.workspace_dir(&agent_id, is_main_agent),
            agent_dir: home.agent_dir(&agent_id),
            account_id,
            agent_id,
        }
    }

    fn agent_spec(&self, request: &ProvisionRequest) -> AgentSpec {
        AgentSpec {
            id: self.agent_id.clone(),
            name: request.name.clone(),
            workspace: self.workspace.display().to_string(),
            agent_dir: self.agent_dir.display().to_string(),
            model: request.model.clone(),
        }
    }
}

/// Reconcile the document towards the requested account, agent and binding.
///
/// Pure with respect to I/O; running it twice with the same inputs leaves
/// the document unchanged the second time. Fails instead of returning a
/// document in which a Telegram account is routed to more than one agent.
pub fn apply(document: &mut Document, request: &ProvisionRequest, plan: &ProvisionPlan) -> Result<()> {
    upsert_agent(document, &plan.agent_spec(request))?;
    if request.is_main {
        set_default_model(document, &request.model)?;
    }
    upsert_account(document, &plan.account_id, &AccountSpec {
        name: request.name.clone(),
        token: request.token.clone(),
        dm_policy: request.dm_policy,
    })?;
    let binding = Binding::new(&plan.agent_id, TELEGRAM_CHANNEL, &plan.account_id);
    install_binding(document, &binding, request.is_main)?;
    ensure_unambiguous(document, TELEGRAM_CHANNEL)
}

/// Result printed after a provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionSummary {
    pub display_name: String,
    pub telegram_username: String,
    pub account_id: String,
    pub agent_id: String,
    pub is_main_agent: bool,
    pub expected_model: String,
    pub verified_provider: Option<Value>,
    pub verified_model: Option<Value>,
    pub config: String,
}

/// Provider and model the agent reported while answering the smoke message,
/// passed through as the agent wrote them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    pub provider: Option<Value>,
    pub model: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AgentReply {
    result: AgentReplyResult,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AgentReplyResult {
    meta: AgentReplyMeta,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AgentReplyMeta {
    #[serde(rename = "agentMeta")]
    agent_meta: AgentMeta,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AgentMeta {
    provider: Option<Value>,
    model: Option<Value>,
}

/// Extract `result.meta.agentMeta.{provider,model}` from the JSON reply of
/// `openclaw agent --json`. A reply that is empty or not valid JSON is an
/// error; a valid reply without agent metadata yields empty fields.
pub fn parse_verification(reply: &str) -> Result<Verification> {
    let reply: AgentReply =
        serde_json::from_str(reply).map_err(|source| Error::MalformedPayload { source })?;
    let meta = reply.result.meta.agent_meta;
    Ok(Verification {
        provider: meta.provider,
        model: meta.model,
    })
}

/// Drives a provisioning run against an OpenClaw home directory.
pub struct Provisioner<'a, R: CommandRunner + ?Sized> {
    home: &'a OpenClawHome,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> Provisioner<'a, R> {
    pub fn new(home: &'a OpenClawHome, runner: &'a R) -> Self {
        Self { home, runner }
    }

    /// Register the account, ensure the agent, rewrite bindings, persist,
    /// then optionally restart the gateway and verify the route.
    ///
    /// Any failing command aborts the run. Changes persisted before the
    /// failure are not rolled back.
    pub fn run(&self, request: &ProvisionRequest) -> Result<ProvisionSummary> {
        let config_path = self.home.config_path();
        if !config_path.is_file() {
            return Err(Error::MissingDocument { path: config_path });
        }

        let plan = ProvisionPlan::new(self.home, request);
        info!(
            account_id = %plan.account_id,
            agent_id = %plan.agent_id,
            dry_run = request.dry_run,
            "provisioning telegram bot"
        );

        let mut document = Document::load(&config_path)?;
        let mut agent_exists = document.find_agent(&plan.agent_id).is_some();

        self.invoke(
            &OpenClawCommand::AddChannelAccount {
                account_id: plan.account_id.clone(),
                name: request.name.clone(),
                token: request.token.clone(),
            },
            request.dry_run,
        )?;

        if !request.is_main && !agent_exists {
            self.invoke(
                &OpenClawCommand::AddAgent {
                    name: request.name.clone(),
                    workspace: plan.workspace.display().to_string(),
                    agent_dir: plan.agent_dir.display().to_string(),
                    model: request.model.clone(),
                },
                request.dry_run,
            )?;
            if !request.dry_run {
                // The CLI wrote the agent record; pick it up.
                document = Document::load(&config_path)?;
                agent_exists = document.find_agent(&plan.agent_id).is_some();
                debug!(agent_id = %plan.agent_id, agent_exists, "reloaded document after agents add");
            }
        }

        apply(&mut document, request, &plan).map_err(|e| e.at_path(&config_path))?;

        if request.dry_run {
            info!(path = %config_path.display(), "dry run: not writing document");
        } else {
            document.save(&config_path)?;
            info!(path = %config_path.display(), "wrote document");
            seed_agent_catalog(
                &self.home.agent_catalog(MAIN_AGENT_ID),
                &self.home.agent_catalog(&plan.agent_id),
            )?;
        }

        if !request.skip_restart {
            self.invoke(&OpenClawCommand::RestartGateway, request.dry_run)?;
            self.invoke(&OpenClawCommand::ChannelStatus, request.dry_run)?;
        }

        let mut verification = Verification::default();
        if !request.skip_verify {
            let reply = self.invoke(
                &OpenClawCommand::SendMessage {
                    agent_id: plan.agent_id.clone(),
                    message: request.verify_message.clone(),
                },
                request.dry_run,
            )?;
            if !request.dry_run {
                verification = parse_verification(&reply)?;
            }
        }

        Ok(ProvisionSummary {
            display_name: request.name.clone(),
            telegram_username: request.username.clone(),
            account_id: plan.account_id,
            agent_id: plan.agent_id,
            is_main_agent: request.is_main,
            expected_model: request.model.clone(),
            verified_provider: verification.provider,
            verified_model: verification.model,
            config: config_path.display().to_string(),
        })
    }

    fn invoke(&self, command: &OpenClawCommand, dry_run: bool) -> Result<String> {
        if dry_run {
            info!(command = %command, "dry run: would run openclaw");
            return Ok(String::new());
        }
        info!(command = %command, "+ openclaw");
        self.runner.run(command)
    }
}
