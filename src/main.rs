mod api;
mod client;
mod config;
mod utils;

use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser};
use snafu::Snafu;

#[macro_export]
macro_rules! print_json {
    ($v:expr) => {
        println!(
            "{}",
            snafu::ResultExt::context(serde_json::to_string_pretty($v), $crate::JsonSnafu)?
        )
    };
}

#[derive(Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{}", source))]
    Config { source: config::Error },

    #[snafu(display("{}", source))]
    Api { source: client::Error },

    #[snafu(display("required flag `--{}` is not set and not found in the active profile", flag))]
    MissingFlag { flag: &'static str },

    #[snafu(display("invalid value for `--{}`: {}", flag, reason))]
    InvalidFlag { flag: &'static str, reason: String },

    #[snafu(display("one of `--cluster` or `--workergroup` must be set"))]
    NoCreateTarget {},

    #[snafu(display("unable to read credentials file {}: {}", path.display(), source))]
    ReadCredentials {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("unable to parse credentials file {}: {}", path.display(), source))]
    ParseCredentials {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("unable to write {}: {}", path.display(), source))]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("unable to serialize output: {}", source))]
    Json { source: serde_json::Error },

    #[snafu(display("unable to read password: {}", source))]
    Prompt { source: dialoguer::Error },
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[derive(Parser)]
#[command(
    name = "cleura",
    version = env!("CLEURA_VERSION"),
    about = "Command line client for the Cleura cloud REST API",
    propagate_version = true
)]
struct Program {
    #[command(flatten)]
    global_options: GlobalOptions,

    #[command(subcommand)]
    command: api::CliCommands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Path to the configuration file [default: $HOME/.config/cleura/config]
    #[arg(long, global = true, env = "CLEURA_CONFIG_PATH")]
    pub config_path: Option<String>,
}

impl GlobalOptions {
    pub fn config_path(&self) -> Result<PathBuf, config::Error> {
        let path = self
            .config_path
            .as_deref()
            .map(|path| PathBuf::from(expand_path(path)));

        config::choose_path(path.as_deref())
    }
}

/// Expands a leading `~` and environment variables, leaving the path as is when that fails.
pub fn expand_path(path: &str) -> String {
    match shellexpand::full(path) {
        Ok(expanded) => expanded.into_owned(),
        Err(error) => {
            log::debug!("not expanding {}: {}", path, error);
            path.to_string()
        }
    }
}

impl Program {
    async fn run(self) -> Result<(), Error> {
        self.command.run(self.global_options).await
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    Program::parse().run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Program::command().debug_assert();
    }

    #[test]
    fn config_path_expands_home() {
        let options = GlobalOptions {
            config_path: Some("~/cleura.yaml".to_string()),
        };

        let path = options.config_path().unwrap();
        assert!(!path.starts_with("~"));
        assert!(path.ends_with("cleura.yaml"));
    }

    #[test]
    fn config_path_is_global() {
        let program = Program::try_parse_from([
            "cleura",
            "config",
            "show",
            "--config-path",
            "/tmp/cleura/config",
        ])
        .unwrap();

        assert_eq!(
            program.global_options.config_path().unwrap(),
            PathBuf::from("/tmp/cleura/config")
        );
    }
}
