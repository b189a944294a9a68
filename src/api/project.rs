use super::args::{require, AuthArgs};
use super::{merge_active_profile, Command};
use crate::config::merge::{FlagSet, FlagSlot};
use crate::print_json;
use crate::{ApiSnafu, Error, GlobalOptions};
use clap::{Parser, Subcommand};
use snafu::ResultExt;

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// List the projects of a domain.
    List(Command<ListCommand>),
}

impl ProjectCommand {
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

    /// Openstack domain id. Try `cleura domain list` for your domains.
    #[arg(short, long, env = "CLEURA_API_DEFAULT_DOMAIN_ID")]
    domain_id: Option<String>,
}

impl FlagSet for ListCommand {
    fn flag_slots(&mut self) -> Vec<FlagSlot<'_>> {
        let mut slots = self.auth.flag_slots();
        slots.push(FlagSlot::new("domain-id", &mut self.domain_id));
        slots
    }
}

impl Command<ListCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        merge_active_profile(&mut self.inner, &global_options);

        let client = self.inner.auth.client()?;
        let domain_id = require(&self.inner.domain_id, "domain-id")?;
        let projects = client.list_projects(domain_id).await.context(ApiSnafu)?;

        print_json!(&projects);

        Ok(())
    }
}
