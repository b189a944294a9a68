use super::args::AuthArgs;
use super::{merge_active_profile, Command};
use crate::config::merge::{FlagSet, FlagSlot};
use crate::print_json;
use crate::{ApiSnafu, Error, GlobalOptions};
use clap::{Parser, Subcommand};
use snafu::ResultExt;

#[derive(Subcommand, Debug)]
pub enum DomainCommand {
    /// List the domains and regions available to the user.
    List(Command<ListCommand>),
}

impl DomainCommand {
    pub async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        match self {
            Self::List(cmd) => cmd.run(global_options).await,
        }
    }
}

#[derive(Parser, Debug)]
pub struct ListCommand {
    #[command(flatten)]
    auth: AuthArgs,
}

impl FlagSet for ListCommand {
    fn flag_slots(&mut self) -> Vec<FlagSlot<'_>> {
        self.auth.flag_slots()
    }
}

impl Command<ListCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        merge_active_profile(&mut self.inner, &global_options);

        let client = self.inner.auth.client()?;
        let domains = client.list_domains().await.context(ApiSnafu)?;

        print_json!(&domains);

        Ok(())
    }
}
