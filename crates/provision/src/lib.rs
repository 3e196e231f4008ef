//! Provision Telegram bots into an OpenClaw installation and keep the
//! `antigravity` model provider in sync across its configuration files.
//!
//! Provides:
//! - Identifier derivation for accounts and agents
//! - Read-modify-write of `openclaw.json` that preserves unknown keys
//! - Account, agent and routing-binding reconciliation
//! - Provider catalog synchronization
//! - A [`CommandRunner`] seam around the `openclaw` CLI

pub mod accounts;
pub mod agents;
pub mod bindings;
pub mod catalog;
pub mod document;
pub mod error;
pub mod home;
pub mod ids;
pub mod provision;
pub mod runner;
pub mod sync;

pub use {
    accounts::DmPolicy,
    document::Document,
    error::{Error, Result},
    home::OpenClawHome,
    provision::{ProvisionPlan, ProvisionRequest, ProvisionSummary, Provisioner},
    runner::{CliRunner, CommandRunner, OpenClawCommand},
    sync::{SyncReport, SyncRequest, sync_provider},
};
