//! Command-line interface definitions for the `devpod-provider-hetzner`
//! binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `devpod-provider-hetzner` binary.
///
/// DevPod invokes one subcommand per lifecycle step and passes every option
/// through the environment.
#[derive(Debug, Parser)]
#[command(
    name = "devpod-provider-hetzner",
    version,
    about = "DevPod provider that runs workspaces on Hetzner Cloud",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Check that the provider options and token are usable.
    #[command(name = "init", about = "Check that the provider options and token are usable")]
    Init,
    /// Create the workspace server and wait until it is ready.
    #[command(name = "create", about = "Create the workspace server and wait until it is ready")]
    Create,
    /// Delete the workspace server, volume and key.
    #[command(name = "delete", about = "Delete the workspace server, volume and key")]
    Delete,
    /// Stop the workspace by deleting its server and keeping its volume.
    #[command(
        name = "stop",
        about = "Stop the workspace by deleting its server and keeping its volume"
    )]
    Stop,
    /// Print the workspace status.
    #[command(name = "status", about = "Print the workspace status")]
    Status,
    /// Run a command on the workspace server over SSH.
    #[command(name = "command", about = "Run a command on the workspace server over SSH")]
    Command(CommandArgs),
}

/// Arguments for the `command` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct CommandArgs {
    /// Shell command to run on the workspace server.
    #[arg(long, env = "COMMAND", value_name = "COMMAND")]
    pub(crate) command: String,
}
