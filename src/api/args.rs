use clap::Args;

use crate::client::{self, Client, ShootScope};
use crate::config::merge::{FlagSet, FlagSlot};
use crate::{ApiSnafu, Error};
use snafu::ResultExt;

// Credentials and endpoint shared by every command talking to the API.
#[derive(Args, Debug)]
pub struct AuthArgs {
    /// Token to authenticate with.
    #[arg(short, long, env = "CLEURA_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Username the token belongs to.
    #[arg(short, long, env = "CLEURA_API_USERNAME")]
    pub username: Option<String>,

    /// Cleura API URL [default: https://rest.cleura.cloud]
    #[arg(long = "api-url", visible_aliases = ["api-host", "host"], env = "CLEURA_API_HOST")]
    pub api_url: Option<String>,
}

impl AuthArgs {
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(client::DEFAULT_API_URL)
    }

    /// A client for the given token, once `--token` and `--username` are known.
    pub fn client(&self) -> Result<Client, Error> {
        let token = require(&self.token, "token")?;
        let username = require(&self.username, "username")?;

        Client::new(self.api_url(), username, token).context(ApiSnafu)
    }
}

impl FlagSet for AuthArgs {
    fn flag_slots(&mut self) -> Vec<FlagSlot<'_>> {
        vec![
            FlagSlot::new("token", &mut self.token),
            FlagSlot::new("username", &mut self.username),
            FlagSlot::new("api-url", &mut self.api_url),
        ]
    }
}

// The project shoot clusters are managed in.
#[derive(Args, Debug)]
pub struct ProjectScopeArgs {
    /// Openstack region. Try `cleura domain list` for the regions of your domain.
    #[arg(short, long, env = "CLEURA_API_DEFAULT_REGION")]
    pub region: Option<String>,

    /// Openstack project id. Try `cleura project list` for the available projects.
    #[arg(long, env = "CLEURA_API_DEFAULT_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Gardener domain of the shoot clusters.
    #[arg(
        long,
        env = "CLEURA_API_GARDENER_DOMAIN",
        default_value = client::DEFAULT_GARDENER_DOMAIN
    )]
    pub gardener_domain: String,
}

impl ProjectScopeArgs {
    pub fn scope(&self) -> Result<ShootScope<'_>, Error> {
        Ok(ShootScope {
            gardener_domain: &self.gardener_domain,
            region: require(&self.region, "region")?,
            project_id: require(&self.project_id, "project-id")?,
        })
    }
}

impl FlagSet for ProjectScopeArgs {
    fn flag_slots(&mut self) -> Vec<FlagSlot<'_>> {
        vec![
            FlagSlot::new("region", &mut self.region),
            FlagSlot::new("project-id", &mut self.project_id),
        ]
    }
}

/// Value of a flag that must be non-empty once the profile has been merged in.
pub fn require<'a>(value: &'a Option<String>, flag: &'static str) -> Result<&'a str, Error> {
    value
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or(Error::MissingFlag { flag })
}
