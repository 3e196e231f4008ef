//! `clawctl provision`: register a Telegram bot with OpenClaw.

use std::path::PathBuf;

use {
    clap::Args,
    clawctl_provision::{
        CliRunner, DmPolicy, OpenClawHome, ProvisionRequest, Provisioner,
        document::to_ascii_json, provision::DEFAULT_VERIFY_MESSAGE,
    },
    secrecy::Secret,
    tracing::info,
};

#[derive(Args)]
pub struct ProvisionArgs {
    /// Display name of the bot (and of its agent).
    #[arg(long)]
    pub name: String,
    /// Telegram username, e.g. @canyonMain_bot.
    #[arg(long)]
    pub username: String,
    /// Bot token from @BotFather.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub token: String,
    /// Model for the agent, e.g. antigravity/gemini-3-pro-low.
    #[arg(long)]
    pub model: String,
    /// Bind the bot to the default `main` agent.
    #[arg(long)]
    pub main: bool,
    /// Agent id override (ignored with --main).
    #[arg(long)]
    pub agent_id: Option<String>,
    /// Account id override (default: derived from the username).
    #[arg(long)]
    pub account_id: Option<String>,
    /// OpenClaw home directory.
    #[arg(long, env = "OPENCLAW_HOME")]
    pub openclaw_home: Option<PathBuf>,
    /// DM policy: open or pairing.
    #[arg(long, default_value_t = DmPolicy::Open)]
    pub dm_policy: DmPolicy,
    /// Do not restart the gateway afterwards.
    #[arg(long)]
    pub skip_restart: bool,
    /// Do not send the verification message.
    #[arg(long)]
    pub skip_verify: bool,
    /// Message sent to the agent to verify the route.
    #[arg(long, default_value = DEFAULT_VERIFY_MESSAGE)]
    pub verify_message: String,
    /// Dry-run: log the commands and changes without running or writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl ProvisionArgs {
    fn into_request(self) -> ProvisionRequest {
        let mut request =
            ProvisionRequest::new(self.name, self.username, Secret::new(self.token), self.model);
        request.is_main = self.main;
        request.agent_id = self.agent_id;
        request.account_id = self.account_id;
        request.dm_policy = self.dm_policy;
        request.skip_restart = self.skip_restart;
        request.skip_verify = self.skip_verify;
        request.verify_message = self.verify_message;
        request.dry_run = self.dry_run;
        request
    }
}

pub fn handle_provision(args: ProvisionArgs, openclaw_bin: &str) -> anyhow::Result<()> {
    let home = OpenClawHome::resolve(args.openclaw_home.as_deref())?;
    let runner = CliRunner::new(openclaw_bin);
    let request = args.into_request();

    let summary = Provisioner::new(&home, &runner).run(&request)?;
    info!(
        account_id = %summary.account_id,
        agent_id = %summary.agent_id,
        "provisioning complete"
    );
    println!("{}", to_ascii_json(&summary)?);
    Ok(())
}
