use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use snafu::ResultExt;

use super::profile::Profile;
use super::{EncodeSnafu, Error, ParseSnafu, DEFAULT_PROFILE_NAME};

/// The root of the configuration file.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub active_profile: String,

    #[serde(default, deserialize_with = "profiles_or_empty")]
    pub profiles: BTreeMap<String, Profile>,
}

impl ConfigDocument {
    /// One empty `default` profile, already active.
    pub fn template() -> Self {
        Self {
            active_profile: DEFAULT_PROFILE_NAME.to_string(),
            profiles: BTreeMap::from([(DEFAULT_PROFILE_NAME.to_string(), Profile::default())]),
        }
    }

    /// Reason the document can not be used by action commands, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.active_profile.is_empty() {
            return Err("active profile is not set".to_string());
        }
        if self.profiles.is_empty() {
            return Err("no profile data found".to_string());
        }
        if !self.profiles.contains_key(&self.active_profile) {
            return Err(format!(
                "no profile data exist for chosen active profile `{}`",
                self.active_profile
            ));
        }

        Ok(())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// `name:` with nothing below it is a profile with no fields set
fn profiles_or_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, Profile>, D::Error>
where
    D: Deserializer<'de>,
{
    let profiles = Option::<BTreeMap<String, Option<Profile>>>::deserialize(deserializer)?;

    Ok(profiles
        .unwrap_or_default()
        .into_iter()
        .map(|(name, profile)| (name, profile.unwrap_or_default()))
        .collect())
}

/// Parses the contents of the configuration file at `path`.
pub fn decode(bytes: &[u8], path: &Path) -> Result<ConfigDocument, Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ConfigDocument::default());
    }

    serde_yaml::from_slice(bytes).context(ParseSnafu { path })
}

pub fn encode(document: &ConfigDocument) -> Result<Vec<u8>, Error> {
    serde_yaml::to_string(document)
        .map(String::into_bytes)
        .context(EncodeSnafu)
}
