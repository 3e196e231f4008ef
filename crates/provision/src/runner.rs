//! Invoking the `openclaw` command-line tool.
//!
//! Every external side effect of provisioning goes through
//! [`CommandRunner`], so the reconciliation flow can be driven by a fake in
//! tests. Calls are blocking and have no timeout.

use std::{
    io::Write,
    process::{Command, Stdio},
};

use {
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, info, warn},
};

use crate::{
    accounts::TELEGRAM_CHANNEL,
    error::{Error, Result},
};

/// Default executable name of the OpenClaw CLI.
pub const DEFAULT_PROGRAM: &str = "openclaw";

/// Runs one `openclaw` invocation and returns its stdout.
///
/// Implementations must fail with [`Error::CommandFailed`] on a non-zero
/// exit status.
pub trait CommandRunner {
    fn run(&self, command: &OpenClawCommand) -> Result<String>;
}

/// Implementation that spawns the real CLI binary.
#[derive(Debug, Clone)]
pub struct CliRunner {
    program: String,
}

impl Default for CliRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl CliRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CommandRunner for CliRunner {
    fn run(&self, command: &OpenClawCommand) -> Result<String> {
        self.run_echoing(command, &mut std::io::stderr())
    }
}

impl CliRunner {
    /// Run `command`, copying its captured output to `echo` so the operator
    /// sees what `openclaw` printed. Returns stdout untrimmed.
    pub fn run_echoing(&self, command: &OpenClawCommand, echo: &mut dyn Write) -> Result<String> {
        debug!(program = %self.program, command = %command, "running openclaw command");

        let output = Command::new(&self.program)
            .args(command.args())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let status = match output.status.code() {
                Some(code) => code.to_string(),
                None => output.status.to_string(),
            };
            warn!(command = %command, status = %status, "openclaw command failed");
            if !stdout.is_empty() {
                writeln!(echo, "{stdout}")?;
            }
            if !stderr.is_empty() {
                writeln!(echo, "{stderr}")?;
            }
            return Err(Error::CommandFailed {
                command: format!("{} {command}", self.program),
                status,
                stdout,
                stderr,
            });
        }

        let shown = stdout.trim();
        if !shown.is_empty() {
            info!(command = %command, "openclaw command output");
            writeln!(echo, "{shown}")?;
        }
        Ok(stdout)
    }
}

/// The `openclaw` invocations used by the provisioner.
#[derive(Clone)]
pub enum OpenClawCommand {
    /// `channels add --channel telegram --account <id> --name <n> --token <t>`
    AddChannelAccount {
        account_id: String,
        name: String,
        token: Secret<String>,
    },
    /// `agents add <name> --non-interactive --workspace <p> --agent-dir <p> --model <m> --json`
    AddAgent {
        name: String,
        workspace: String,
        agent_dir: String,
        model: String,
    },
    /// `gateway restart`
    RestartGateway,
    /// `channels status`
    ChannelStatus,
    /// `agent --agent <id> --channel telegram --message <text> --json`
    SendMessage { agent_id: String, message: String },
}

impl OpenClawCommand {
    /// Full argument vector, secrets included.
    pub fn args(&self) -> Vec<String> {
        self.render(|token| token.expose_secret().clone())
    }

    /// Short name for logs and test assertions, e.g. `channels add`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AddChannelAccount { .. } => "channels add",
            Self::AddAgent { .. } => "agents add",
            Self::RestartGateway => "gateway restart",
            Self::ChannelStatus => "channels status",
            Self::SendMessage { .. } => "agent",
        }
    }

    fn render(&self, token: impl Fn(&Secret<String>) -> String) -> Vec<String> {
        match self {
            Self::AddChannelAccount {
                account_id,
                name,
                token: secret,
            } => vec![
                "channels".into(),
                "add".into(),
                "--channel".into(),
                TELEGRAM_CHANNEL.into(),
                "--account".into(),
                account_id.clone(),
                "--name".into(),
                name.clone(),
                "--token".into(),
                token(secret),
            ],
            Self::AddAgent {
                name,
                workspace,
                agent_dir,
                model,
            } => vec![
                "agents".into(),
                "add".into(),
                name.clone(),
                "--non-interactive".into(),
                "--workspace".into(),
                workspace.clone(),
                "--agent-dir".into(),
                agent_dir.clone(),
                "--model".into(),
                model.clone(),
                "--json".into(),
            ],
            Self::RestartGateway => vec!["gateway".into(), "restart".into()],
            Self::ChannelStatus => vec!["channels".into(), "status".into()],
            Self::SendMessage { agent_id, message } => vec![
                "agent".into(),
                "--agent".into(),
                agent_id.clone(),
                "--channel".into(),
                TELEGRAM_CHANNEL.into(),
                "--message".into(),
                message.clone(),
                "--json".into(),
            ],
        }
    }
}

/// Shell-quoted command line with the bot token redacted.
impl std::fmt::Display for OpenClawCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let args = self.render(|_| "[REDACTED]".to_string());
        let quoted: Vec<String> = args.iter().map(|arg| shell_quote(arg)).collect();
        f.write_str(&quoted.join(" "))
    }
}

impl std::fmt::Debug for OpenClawCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OpenClawCommand({self})")
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r#"'"'"'"#))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn add_account() -> OpenClawCommand {
        OpenClawCommand::AddChannelAccount {
            account_id: "ops".into(),
            name: "Ops Team".into(),
            token: Secret::new("123:ABC".into()),
        }
    }

    #[test]
    fn channel_add_args() {
        assert_eq!(add_account().args(), vec![
            "channels", "add", "--channel", "telegram", "--account", "ops", "--name",
            "Ops Team", "--token", "123:ABC",
        ]);
    }

    #[test]
    fn agent_add_args() {
        let cmd = OpenClawCommand::AddAgent {
            name: "Ops".into(),
            workspace: "/h/workspace-ops".into(),
            agent_dir: "/h/agents/ops/agent".into(),
            model: "m1".into(),
        };
        assert_eq!(cmd.args(), vec![
            "agents",
            "add",
            "Ops",
            "--non-interactive",
            "--workspace",
            "/h/workspace-ops",
            "--agent-dir",
            "/h/agents/ops/agent",
            "--model",
            "m1",
            "--json",
        ]);
    }

    #[test]
    fn display_redacts_token_and_quotes() {
        let rendered = add_account().to_string();
        assert!(!rendered.contains("123:ABC"));
        assert!(rendered.contains("'Ops Team'"));
        assert!(rendered.contains("--token '[REDACTED]'"));
        assert_eq!(
            OpenClawCommand::SendMessage {
                agent_id: "main".into(),
                message: "reply only: ok".into(),
            }
            .to_string(),
            "agent --agent main --channel telegram --message 'reply only: ok' --json"
        );
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("/a/b-c_d"), "/a/b-c_d");
    }

    #[cfg(unix)]
    #[test]
    fn cli_runner_reports_non_zero_exit() {
        let runner = CliRunner::new("false");
        let err = runner.run(&OpenClawCommand::ChannelStatus).unwrap_err();
        match err {
            Error::CommandFailed { status, .. } => assert_eq!(status, "1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn cli_runner_returns_stdout() {
        let runner = CliRunner::new("echo");
        let out = runner.run(&OpenClawCommand::RestartGateway).unwrap();
        assert_eq!(out, "gateway restart\n");
    }

    #[cfg(unix)]
    #[test]
    fn successful_output_is_shown_to_the_operator() {
        let runner = CliRunner::new("echo");
        let mut shown = Vec::new();
        let out = runner
            .run_echoing(&OpenClawCommand::ChannelStatus, &mut shown)
            .unwrap();

        assert_eq!(out, "channels status\n");
        assert_eq!(String::from_utf8(shown).unwrap(), "channels status\n");
    }

    #[cfg(unix)]
    #[test]
    fn failed_output_is_shown_to_the_operator() {
        // `ls channels status` fails on the missing paths and complains on
        // stderr.
        let runner = CliRunner::new("ls");
        let mut shown = Vec::new();
        let err = runner
            .run_echoing(&OpenClawCommand::ChannelStatus, &mut shown)
            .unwrap_err();

        assert!(matches!(err, Error::CommandFailed { .. }));
        assert!(!shown.is_empty());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let runner = CliRunner::new("definitely-not-an-openclaw-binary");
        let err = runner.run(&OpenClawCommand::ChannelStatus).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }
}
