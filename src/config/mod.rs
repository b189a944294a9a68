pub mod codec;
pub mod lock;
pub mod merge;
pub mod profile;
pub mod repository;
pub mod template;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use snafu::Snafu;

pub use codec::ConfigDocument;
pub use profile::{Profile, ProfileField};
pub use repository::{ConfigRepository, DocumentStore, FileStore};

/// Name of the profile written by `config generate-template`.
pub const DEFAULT_PROFILE_NAME: &str = "default";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("configuration file {} does not exist", path.display()))]
    NotFound { path: PathBuf },

    #[snafu(display("unable to access configuration file {}: {}", path.display(), source))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("unable to parse configuration file {}: {}", path.display(), source))]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("unable to encode configuration file: {}", source))]
    Encode { source: serde_yaml::Error },

    #[snafu(display("configuration file {} is not valid, {}", path.display(), reason))]
    Validation { path: PathBuf, reason: String },

    #[snafu(display(
        "configuration file {} is locked by another process (waited {:?})",
        path.display(),
        timeout
    ))]
    LockTimeout { path: PathBuf, timeout: Duration },

    #[snafu(display("unable to lock configuration file {}: {}", path.display(), source))]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("profile `{}` is not present in configuration file {}", name, path.display()))]
    ProfileNotFound { name: String, path: PathBuf },

    #[snafu(display("profile name is empty"))]
    EmptyProfileName {},

    #[snafu(display(
        "key `{}` is not supported, expected one of: {}",
        key,
        ProfileField::keys().join(", ")
    ))]
    UnsupportedField { key: String },

    #[snafu(display("unable to determine the home directory for the default configuration path"))]
    HomeDirectory {},

    #[snafu(display("can not create path to {}: {}", path.display(), source))]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// Whether the error only means "no configuration yet", the expected first-run state.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// `$HOME/.config/cleura/config`
pub fn default_config_path() -> Result<PathBuf, Error> {
    let base_dirs = BaseDirs::new().ok_or(Error::HomeDirectory {})?;

    Ok(base_dirs
        .home_dir()
        .join(".config")
        .join("cleura")
        .join("config"))
}

/// Pick `path` when supplied, otherwise the default location in the user's home directory.
pub fn choose_path(path: Option<&Path>) -> Result<PathBuf, Error> {
    match path {
        Some(path) if !path.as_os_str().is_empty() => Ok(path.to_path_buf()),
        _ => default_config_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_default() {
        let path = choose_path(Some(Path::new("/tmp/cleura/config"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/cleura/config"));
    }

    #[test]
    fn empty_path_falls_back_to_default() {
        let Ok(default) = default_config_path() else {
            // no home directory in this environment
            return;
        };

        assert_eq!(choose_path(Some(Path::new(""))).unwrap(), default);
        assert_eq!(choose_path(None).unwrap(), default);
        assert!(default.ends_with(".config/cleura/config"));
    }

    #[test]
    fn unsupported_field_lists_known_keys() {
        let error = Error::UnsupportedField {
            key: "password".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "key `password` is not supported, expected one of: username, token, domain-id, region, project-id, api-url"
        );
    }
}
