//! Binary entry point for the Hetzner Cloud DevPod provider.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use devpod_provider_hetzner::{
    DEFAULT_POLL_INTERVAL, HetznerApi, KeyStoreError, Lifecycle, MachineKeys, OptionsError,
    ProcessCommandRunner, ProviderError, ProviderOptions, ProvisionError, RawOptions, SshClient,
    SshConfig, SshConfigLoadError, SshError, SshProbe, StreamingCommandRunner, WorkspaceName,
    WorkspaceOptions, WorkspaceStatus, logging,
};

mod cli;

use cli::{Cli, CommandArgs};

type ProviderLifecycle = Lifecycle<HetznerApi, SshProbe<ProcessCommandRunner>>;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Keys(#[from] KeyStoreError),
    #[error(transparent)]
    SshConfig(#[from] SshConfigLoadError),
    #[error(transparent)]
    Ssh(#[from] SshError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error("vm not found")]
    VmNotFound,
    #[error("server {name} has no public IPv4 address")]
    NoPublicAddress { name: String },
    #[error("remote command terminated without an exit status")]
    MissingExitCode,
    #[error("failed to write output: {0}")]
    Output(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = logging::init() {
        writeln!(io::stderr(), "{err}").ok();
    }

    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let raw = RawOptions::from_env()?;
    match cli {
        Cli::Init => {
            let options = ProviderOptions::from_raw(&raw)?;
            provider_lifecycle(&options)?.init().await?;
            Ok(0)
        }
        Cli::Create => {
            let target = Target::load(&raw)?;
            let keys = MachineKeys::load(&target.options.machine.machine_folder)?;
            let provider = &target.options.provider;
            let plan = target
                .lifecycle
                .build_server_request(&target.workspace, provider, &keys)
                .await?;
            target.lifecycle.create(plan, provider.disk_size_gb).await?;
            Ok(0)
        }
        Cli::Delete => {
            let target = Target::load(&raw)?;
            target.lifecycle.delete(&target.workspace).await?;
            target.wait_for_status(WorkspaceStatus::NotFound).await;
            Ok(0)
        }
        Cli::Stop => {
            let target = Target::load(&raw)?;
            target.lifecycle.stop(&target.workspace).await?;
            target.wait_for_status(WorkspaceStatus::Stopped).await;
            Ok(0)
        }
        Cli::Status => {
            let target = Target::load(&raw)?;
            let status = target.lifecycle.status(&target.workspace).await?;
            writeln!(io::stdout(), "{status}").map_err(|err| CliError::Output(err.to_string()))?;
            Ok(0)
        }
        Cli::Command(args) => {
            let target = Target::load(&raw)?;
            let keys = MachineKeys::load(&target.options.machine.machine_folder)?;
            target.run_command(&keys, &args).await
        }
    }
}

/// Everything a machine-scoped subcommand acts on.
struct Target {
    options: WorkspaceOptions,
    lifecycle: ProviderLifecycle,
    workspace: WorkspaceName,
}

impl Target {
    fn load(raw: &RawOptions) -> Result<Self, CliError> {
        let options = WorkspaceOptions::from_raw(raw)?;
        let lifecycle = provider_lifecycle(&options.provider)?;
        let workspace = WorkspaceName::from_machine_id(&options.machine.machine_id);
        Ok(Self {
            options,
            lifecycle,
            workspace,
        })
    }

    /// Polls until the workspace reaches `target`. The operation has already
    /// succeeded, so a failing status check only ends the wait.
    async fn wait_for_status(&self, target: WorkspaceStatus) {
        loop {
            match self.lifecycle.status(&self.workspace).await {
                Ok(status) if status == target => return,
                Ok(status) => debug!(%status, %target, "waiting for workspace status"),
                Err(err) => {
                    warn!(error = %err, "status check failed, no longer waiting");
                    return;
                }
            }
            sleep(DEFAULT_POLL_INTERVAL).await;
        }
    }

    async fn run_command(&self, keys: &MachineKeys, args: &CommandArgs) -> Result<i32, CliError> {
        let server = self
            .lifecycle
            .find_server_by_name(self.workspace.as_str())
            .await?
            .ok_or(CliError::VmNotFound)?;
        let host = server
            .public_ipv4()
            .ok_or_else(|| CliError::NoPublicAddress {
                name: server.name.clone(),
            })?;

        let ssh = SshClient::new(SshConfig::load_without_cli_args()?, StreamingCommandRunner)?;
        let output = ssh.run(host, keys.identity(), &args.command)?;
        output.code.ok_or(CliError::MissingExitCode)
    }
}

fn provider_lifecycle(options: &ProviderOptions) -> Result<ProviderLifecycle, CliError> {
    if options.token_from_deprecated_key {
        warn!("TOKEN envvar is deprecated in favour of HCLOUD_TOKEN");
    }
    let ssh = SshClient::new(SshConfig::load_without_cli_args()?, ProcessCommandRunner)?;
    let api = HetznerApi::new(options.token.clone())?;
    Ok(Lifecycle::new(api, SshProbe::new(ssh)))
}

fn report_error(err: &CliError) {
    error!(error = %err, "command failed");
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
