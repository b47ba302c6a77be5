//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::application::services::bulk::LifecycleAction;
use crate::commands;

/// Register database exporters with an SSM server and keep them in sync
#[derive(Parser)]
#[command(
    name = "ssm-admin",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start monitoring a service type on this node
    Add(commands::add::AddArgs),

    /// Stop monitoring a service type on this node
    #[command(alias = "rm")]
    Remove(commands::remove::RemoveArgs),

    /// Start the exporter of a service type
    Start(commands::lifecycle::LifecycleArgs),

    /// Stop the exporter of a service type
    Stop(commands::lifecycle::LifecycleArgs),

    /// Restart the exporter of a service type
    Restart(commands::lifecycle::LifecycleArgs),

    /// Start the exporter of a service type at boot
    Enable(commands::lifecycle::LifecycleArgs),

    /// Do not start the exporter of a service type at boot
    Disable(commands::lifecycle::LifecycleArgs),

    /// List monitored services on this node
    #[command(alias = "ls")]
    List,

    /// Compare local services with the server
    Check,

    /// Fix what `check` reports
    Repair,

    /// Convert legacy units and exporter configs to the current layout
    Upgrade,

    /// Remove all services and client configuration
    Uninstall(commands::uninstall::UninstallArgs),

    /// Show or change client configuration
    Config(commands::config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let yes = matches!(&self.command, Command::Uninstall(a) if a.yes);
        let flags = AppFlags {
            output: OutputFlags {
                no_color: self.no_color,
                quiet: self.quiet,
                json: self.json,
            },
            behaviour: BehaviourFlags { yes },
        };
        let app = AppContext::new(&flags).await?;

        match self.command {
            Command::Add(args) => commands::add::run(&app, &args).await,
            Command::Remove(args) => commands::remove::run(&app, &args).await,
            Command::List => commands::list::run(&app).await,
            Command::Check => commands::check::run(&app).await,
            Command::Repair => commands::check::repair(&app).await,
            Command::Upgrade => commands::upgrade::run(&app).await,
            Command::Uninstall(args) => commands::uninstall::run(&app, &args).await,
            Command::Config(args) => commands::config::run(&app, args),
            Command::Start(args) => {
                commands::lifecycle::run(&app, LifecycleAction::Start, &args).await
            }
            Command::Stop(args) => {
                commands::lifecycle::run(&app, LifecycleAction::Stop, &args).await
            }
            Command::Restart(args) => {
                commands::lifecycle::run(&app, LifecycleAction::Restart, &args).await
            }
            Command::Enable(args) => {
                commands::lifecycle::run(&app, LifecycleAction::Enable, &args).await
            }
            Command::Disable(args) => {
                commands::lifecycle::run(&app, LifecycleAction::Disable, &args).await
            }
        }
    }
}
