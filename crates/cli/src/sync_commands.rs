//! `clawctl sync-models`: publish the antigravity provider everywhere.

use std::path::PathBuf;

use {
    clap::Args,
    clawctl_provision::{
        SyncRequest, catalog::DEFAULT_BASE_URL, document::to_ascii_json, sync_provider,
    },
    secrecy::Secret,
};

#[derive(Args)]
pub struct SyncArgs {
    /// Path to openclaw.json.
    #[arg(long)]
    pub openclaw_json: PathBuf,
    /// API key for the antigravity proxy.
    #[arg(long, env = "ANTIGRAVITY_API_KEY", hide_env_values = true)]
    pub api_key: String,
    /// Base URL of the antigravity proxy.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    /// Model id to publish (repeatable; default: the built-in list).
    #[arg(long = "model")]
    pub models: Vec<String>,
    /// Agent models.json to update (repeatable; default: every agent under
    /// the openclaw.json directory).
    #[arg(long = "agent-models")]
    pub agent_models: Vec<PathBuf>,
    /// Dry-run: report what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,
    /// Emit structured JSON output.
    #[arg(long)]
    pub json: bool,
}

pub fn handle_sync(args: SyncArgs) -> anyhow::Result<()> {
    let mut request = SyncRequest::new(args.openclaw_json, Secret::new(args.api_key));
    request.base_url = args.base_url;
    request.models = args.models;
    request.agent_catalogs = args.agent_models;
    request.dry_run = args.dry_run;

    let report = sync_provider(&request)?;
    if args.json {
        println!("{}", to_ascii_json(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
