use std::path::PathBuf;

use super::Command;
use crate::config::{template, ConfigRepository, Profile, ProfileField};
use crate::utils::StyledStr;
use crate::{ConfigSnafu, Error, GlobalOptions};
use clap::{Parser, Subcommand};
use snafu::ResultExt;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a configuration file with one empty `default` profile.
    ///
    /// NB: an existing file at the destination is overwritten without confirmation.
    GenerateTemplate(Command<GenerateTemplateCommand>),
    /// Choose the active profile.
    Set(Command<SetCommand>),
    /// List the profiles in the configuration file.
    List(Command<ListCommand>),
    /// Show the settings of a profile, secrets masked.
    Show(Command<ShowCommand>),
    /// Show which profile is active.
    ShowActive(Command<ShowActiveCommand>),
    /// Add a profile, replacing every setting of an existing profile with the same name.
    AddProfile(Command<AddProfileCommand>),
    /// Change one setting of the active profile. An empty value clears it.
    SetField(Command<SetFieldCommand>),
}

impl ConfigCommand {
    pub async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        match self {
            Self::GenerateTemplate(cmd) => cmd.run(global_options).await,
            Self::Set(cmd) => cmd.run(global_options).await,
            Self::List(cmd) => cmd.run(global_options).await,
            Self::Show(cmd) => cmd.run(global_options).await,
            Self::ShowActive(cmd) => cmd.run(global_options).await,
            Self::AddProfile(cmd) => cmd.run(global_options).await,
            Self::SetField(cmd) => cmd.run(global_options).await,
        }
    }
}

fn load(global_options: &GlobalOptions) -> Result<ConfigRepository, Error> {
    let path = global_options.config_path().context(ConfigSnafu)?;

    ConfigRepository::load(path).context(ConfigSnafu)
}

#[derive(Parser, Debug)]
pub struct GenerateTemplateCommand {
    /// Where to write the template. Falls back to --config-path, then $HOME/.config/cleura/config.
    #[arg(short, long)]
    output_file: Option<String>,
}

impl Command<GenerateTemplateCommand> {
    async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        let output = match self.inner.output_file {
            Some(output_file) if !output_file.is_empty() => {
                PathBuf::from(crate::expand_path(&output_file))
            }
            _ => global_options.config_path().context(ConfigSnafu)?,
        };

        let path = template::generate(Some(&output)).context(ConfigSnafu)?;

        StyledStr::success(format!(
            "configuration template written to {}",
            path.display()
        ))
        .eprint();

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct SetCommand {
    /// Name of a profile defined in the configuration file.
    #[arg(short, long)]
    name: String,
}

impl Command<SetCommand> {
    async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        let mut repository = load(&global_options)?;
        repository
            .set_active_profile(&self.inner.name)
            .context(ConfigSnafu)?;

        StyledStr::success(format!("active profile is now `{}`", self.inner.name)).eprint();

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct ListCommand;

impl Command<ListCommand> {
    async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        let repository = load(&global_options)?;
        let active = repository.active_profile_name();

        println!(
            "Available profiles: (in {})",
            repository.location().display()
        );
        for (index, name) in repository.profile_names().into_iter().enumerate() {
            if name == active {
                println!("{}. {} (active)", index + 1, name);
            } else {
                println!("{}. {}", index + 1, name);
            }
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct ShowCommand {
    /// Profile to show. The active profile when omitted.
    #[arg(short, long)]
    name: Option<String>,
}

impl Command<ShowCommand> {
    async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        let repository = load(&global_options)?;
        let name = match self.inner.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => repository.active_profile_name(),
        };
        let fields = repository.profile_fields(Some(name)).context(ConfigSnafu)?;

        println!(
            "Profile: `{}` ({})\n",
            name,
            repository.location().display()
        );
        for (field, value) in fields {
            println!("{:<10}: {}", field.key(), field.display_value(&value));
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct ShowActiveCommand;

impl Command<ShowActiveCommand> {
    async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        let repository = load(&global_options)?;

        println!(
            "Active profile: `{}` (in {})",
            repository.active_profile_name(),
            repository.location().display()
        );

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct AddProfileCommand {
    /// Name of the profile.
    #[arg(short, long)]
    name: String,

    #[arg(long)]
    username: Option<String>,

    /// Stored in plain text.
    #[arg(long)]
    token: Option<String>,

    #[arg(long)]
    domain_id: Option<String>,

    #[arg(long)]
    region: Option<String>,

    #[arg(long)]
    project_id: Option<String>,

    #[arg(long = "api-url", visible_alias = "api-host")]
    api_url: Option<String>,

    /// Make the new profile the active one.
    #[arg(long)]
    activate: bool,
}

impl Command<AddProfileCommand> {
    async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        let inner = self.inner;
        let mut repository = load(&global_options)?;

        let mut profile = Profile::default();
        for (field, value) in [
            (ProfileField::Username, inner.username),
            (ProfileField::Token, inner.token),
            (ProfileField::DomainId, inner.domain_id),
            (ProfileField::Region, inner.region),
            (ProfileField::ProjectId, inner.project_id),
            (ProfileField::ApiUrl, inner.api_url),
        ] {
            profile.set(field, value.as_deref().unwrap_or_default());
        }

        repository
            .add_or_replace_profile(&inner.name, profile)
            .context(ConfigSnafu)?;
        if inner.activate {
            repository
                .set_active_profile(&inner.name)
                .context(ConfigSnafu)?;
        }

        StyledStr::success(format!("profile `{}` saved", inner.name)).eprint();

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct SetFieldCommand {
    /// One of: username, token, domain-id, region, project-id, api-url.
    #[arg(short, long)]
    key: String,

    #[arg(short, long, allow_hyphen_values = true)]
    value: String,
}

impl Command<SetFieldCommand> {
    async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        let mut repository = load(&global_options)?;
        let changed = repository
            .set_active_profile_field(&self.inner.key, &self.inner.value)
            .context(ConfigSnafu)?;

        let message = if changed {
            StyledStr::success(format!(
                "`{}` updated in profile `{}`",
                self.inner.key,
                repository.active_profile_name()
            ))
        } else {
            StyledStr::warning(format!("`{}` already has this value", self.inner.key))
        };
        message.eprint();

        Ok(())
    }
}
