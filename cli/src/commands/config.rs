//! `ssm-admin config`: show and set client configuration.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;
use crate::domain::config::ConfigUpdate;

/// Arguments for the config command.
#[derive(Args, Default)]
pub struct ConfigArgs {
    /// Print the current configuration and exit
    #[arg(long)]
    pub show: bool,

    /// SSM server address, `host[:port]`
    #[arg(long, value_name = "ADDRESS")]
    pub server: Option<String>,

    /// HTTP basic auth user for the server
    #[arg(long, value_name = "USER")]
    pub server_user: Option<String>,

    /// HTTP basic auth password for the server
    #[arg(long, value_name = "PASSWORD")]
    pub server_password: Option<String>,

    /// Connect to the server over SSL
    #[arg(long, conflicts_with = "server_insecure_ssl")]
    pub server_ssl: bool,

    /// Connect over SSL without verifying the certificate
    #[arg(long)]
    pub server_insecure_ssl: bool,

    /// Name this client registers under
    #[arg(long, value_name = "NAME")]
    pub client_name: Option<String>,

    /// Address the server reaches this client on
    #[arg(long, value_name = "ADDRESS")]
    pub client_address: Option<String>,

    /// Address exporters listen on (defaults to the client address)
    #[arg(long, value_name = "ADDRESS")]
    pub bind_address: Option<String>,
}

impl From<ConfigArgs> for ConfigUpdate {
    fn from(args: ConfigArgs) -> Self {
        Self {
            server_address: args.server,
            server_user: args.server_user,
            server_password: args.server_password,
            server_ssl: args.server_ssl.then_some(true),
            server_insecure_ssl: args.server_insecure_ssl.then_some(true),
            client_name: args.client_name,
            client_address: args.client_address,
            bind_address: args.bind_address,
        }
    }
}

/// Run `ssm-admin config`.
///
/// # Errors
///
/// Returns an error if a value is invalid or the file cannot be written.
pub fn run(app: &AppContext, args: ConfigArgs) -> Result<ExitCode> {
    if args.show {
        return show_config(app);
    }
    let config = config_service::update_config(&app.config_store, args.into())?;
    app.renderer()
        .render_config(&config, &app.config_store.path())?;
    Ok(ExitCode::SUCCESS)
}

fn show_config(app: &AppContext) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    app.renderer()
        .render_config(&config, &app.config_store.path())?;
    Ok(ExitCode::SUCCESS)
}
