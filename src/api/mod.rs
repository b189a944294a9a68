pub mod args;
mod config;
mod domain;
mod project;
mod shoot;
mod token;

use clap::{Args, Parser, Subcommand};

use crate::config::merge::{merge_from_config, FlagSet};
use crate::{Error, GlobalOptions};

#[derive(Parser, Debug)]
pub struct Command<T: Args> {
    #[command(flatten)]
    inner: T,
}

#[derive(Subcommand, Debug)]
pub enum CliCommands {
    /// Manage configuration profiles in the local configuration file.
    #[command(subcommand)]
    Config(config::ConfigCommand),

    /// Obtain, validate and revoke API tokens.
    #[command(subcommand)]
    Token(token::TokenCommand),

    /// Openstack domains available to the user.
    #[command(subcommand)]
    Domain(domain::DomainCommand),

    /// Openstack projects within a domain.
    #[command(subcommand)]
    Project(project::ProjectCommand),

    /// Manage Gardener shoot clusters.
    #[command(subcommand)]
    Shoot(shoot::ShootCommand),
}

impl CliCommands {
    pub async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        match self {
            Self::Config(cmd) => cmd.run(global_options).await,
            Self::Token(cmd) => cmd.run(global_options).await,
            Self::Domain(cmd) => cmd.run(global_options).await,
            Self::Project(cmd) => cmd.run(global_options).await,
            Self::Shoot(cmd) => cmd.run(global_options).await,
        }
    }
}

/// Fills flags left unset with values from the active profile, if a usable
/// configuration file exists.
fn merge_active_profile<F: FlagSet>(flags: &mut F, global_options: &GlobalOptions) {
    match global_options.config_path() {
        Ok(path) => merge_from_config(flags, &path),
        Err(error) => log::warn!("not using configuration file: {}", error),
    }
}
