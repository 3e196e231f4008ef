mod provision_commands;
mod sync_commands;

use {
    clap::{Parser, Subcommand},
    clawctl_provision::runner::DEFAULT_PROGRAM,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "clawctl", about = "clawctl: provision Telegram bots into OpenClaw")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// The openclaw executable to invoke.
    #[arg(long, global = true, env = "OPENCLAW_BIN", default_value = DEFAULT_PROGRAM)]
    openclaw_bin: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a Telegram bot: channel account, agent and routing binding.
    Provision(provision_commands::ProvisionArgs),
    /// Sync the antigravity model provider across openclaw.json and agent
    /// model catalogs.
    SyncModels(sync_commands::SyncArgs),
}

/// Initialise tracing. Logs go to stderr so stdout carries only the command
/// result.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "clawctl starting");

    match cli.command {
        Commands::Provision(args) => provision_commands::handle_provision(args, &cli.openclaw_bin),
        Commands::SyncModels(args) => sync_commands::handle_sync(args),
    }
}
