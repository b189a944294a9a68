use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;

use super::args::{require, AuthArgs};
use super::{merge_active_profile, Command};
use crate::client::Client;
use crate::config::merge::{FlagSet, FlagSlot};
use crate::config::{ConfigRepository, ProfileField};
use crate::utils::StyledStr;
use crate::{
    ApiSnafu, ConfigSnafu, Error, GlobalOptions, ParseCredentialsSnafu, PromptSnafu,
    ReadCredentialsSnafu,
};
use clap::{Parser, Subcommand};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;
use serde::Deserialize;
use snafu::ResultExt;

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Log in with username and password and print the issued token as shell exports.
    Get(Command<GetCommand>),
    /// Check that a token is still accepted.
    Validate(Command<ValidateCommand>),
    /// Revoke a token.
    Revoke(Command<RevokeCommand>),
}

impl TokenCommand {
    pub async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        match self {
            Self::Get(cmd) => cmd.run(global_options).await,
            Self::Validate(cmd) => cmd.run(global_options).await,
            Self::Revoke(cmd) => cmd.run(global_options).await,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Parser, Debug)]
pub struct GetCommand {
    /// Username for the token request.
    #[arg(short, long, env = "CLEURA_API_USERNAME")]
    username: Option<String>,

    /// Password for the token request. Prompted for when omitted on a terminal.
    #[arg(
        short,
        long,
        env = "CLEURA_API_PASSWORD",
        hide_env_values = true,
        conflicts_with = "credentials_file"
    )]
    password: Option<String>,

    /// JSON file holding `username` and `password`.
    #[arg(short, long)]
    credentials_file: Option<String>,

    /// Cleura API URL [default: https://rest.cleura.cloud]
    #[arg(long = "api-url", visible_aliases = ["api-host", "host"], env = "CLEURA_API_HOST")]
    api_url: Option<String>,

    /// Save the token to the active profile. NB: the token is stored in plain text.
    #[arg(long)]
    update_config: bool,
}

impl FlagSet for GetCommand {
    fn flag_slots(&mut self) -> Vec<FlagSlot<'_>> {
        vec![
            FlagSlot::new("username", &mut self.username),
            FlagSlot::new("api-url", &mut self.api_url),
        ]
    }
}

impl GetCommand {
    fn credentials(&self) -> Result<Credentials, Error> {
        if let Some(file) = &self.credentials_file {
            let path = PathBuf::from(crate::expand_path(file));
            let contents = fs::read_to_string(&path).context(ReadCredentialsSnafu { path: &path })?;
            let credentials: Credentials =
                serde_json::from_str(&contents).context(ParseCredentialsSnafu { path: &path })?;

            if credentials.username.is_empty() {
                return Err(Error::MissingFlag { flag: "username" });
            }
            if credentials.password.is_empty() {
                return Err(Error::MissingFlag { flag: "password" });
            }

            return Ok(credentials);
        }

        let username = require(&self.username, "username")?.to_string();
        let password = match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => password.to_string(),
            None if std::io::stdin().is_terminal() => {
                Password::with_theme(&ColorfulTheme::default())
                    .with_prompt(format!("Password for {username}"))
                    .interact()
                    .context(PromptSnafu)?
            }
            None => return Err(Error::MissingFlag { flag: "password" }),
        };

        Ok(Credentials { username, password })
    }

    fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(crate::client::DEFAULT_API_URL)
    }
}

impl Command<GetCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        merge_active_profile(&mut self.inner, &global_options);

        let credentials = self.inner.credentials()?;
        let api_url = self.inner.api_url();
        let client = Client::login(api_url, &credentials.username, &credentials.password)
            .await
            .context(ApiSnafu)?;

        if self.inner.update_config {
            let path = global_options.config_path().context(ConfigSnafu)?;
            let mut repository = ConfigRepository::load(path).context(ConfigSnafu)?;
            repository
                .set_active_profile_field(ProfileField::Token.key(), client.token())
                .context(ConfigSnafu)?;

            StyledStr::success(format!(
                "token saved to profile `{}`",
                repository.active_profile_name()
            ))
            .eprint();
        }

        println!("export CLEURA_API_TOKEN={}", client.token());
        println!("export CLEURA_API_USERNAME={}", client.username());
        println!("export CLEURA_API_HOST={}", api_url);

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    auth: AuthArgs,
}

impl FlagSet for ValidateCommand {
    fn flag_slots(&mut self) -> Vec<FlagSlot<'_>> {
        self.auth.flag_slots()
    }
}

impl Command<ValidateCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        merge_active_profile(&mut self.inner, &global_options);

        let client = self.inner.auth.client()?;
        client.validate_token().await.context(ApiSnafu)?;

        StyledStr::success("token is valid").eprint();

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct RevokeCommand {
    #[command(flatten)]
    auth: AuthArgs,
}

impl FlagSet for RevokeCommand {
    fn flag_slots(&mut self) -> Vec<FlagSlot<'_>> {
        self.auth.flag_slots()
    }
}

impl Command<RevokeCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        merge_active_profile(&mut self.inner, &global_options);

        let client = self.inner.auth.client()?;
        client.revoke_token().await.context(ApiSnafu)?;

        StyledStr::success("token revoked").eprint();

        Ok(())
    }
}
