use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::Error;

/// Shown instead of secret values whenever a profile is printed.
pub const MASKED_VALUE: &str = "****hidden****";

/// A named set of connection defaults stored in the configuration file.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Profile {
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<String>,

    #[serde(
        rename = "domain-id",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub domain_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<String>,

    #[serde(
        rename = "project-id",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<String>,

    #[serde(
        rename = "api-url",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_url: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|value| !value.is_empty()))
}

impl Profile {
    pub fn get(&self, field: ProfileField) -> Option<&str> {
        field.get(self)
    }

    /// Returns whether the stored value changed. An empty `value` clears the field.
    pub fn set(&mut self, field: ProfileField, value: &str) -> bool {
        let value = (!value.is_empty()).then(|| value.to_string());
        let slot = field.slot(self);

        if *slot == value {
            return false;
        }

        *slot = value;
        true
    }

    /// Every recognized field in table order, unset fields as empty strings.
    pub fn fields(&self) -> Vec<(ProfileField, String)> {
        ProfileField::ALL
            .iter()
            .map(|field| (*field, self.get(*field).unwrap_or_default().to_string()))
            .collect()
    }
}

/// The closed set of keys a profile understands, shared by the file format and CLI flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileField {
    Username,
    Token,
    DomainId,
    Region,
    ProjectId,
    ApiUrl,
}

impl ProfileField {
    pub const ALL: [ProfileField; 6] = [
        ProfileField::Username,
        ProfileField::Token,
        ProfileField::DomainId,
        ProfileField::Region,
        ProfileField::ProjectId,
        ProfileField::ApiUrl,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ProfileField::Username => "username",
            ProfileField::Token => "token",
            ProfileField::DomainId => "domain-id",
            ProfileField::Region => "region",
            ProfileField::ProjectId => "project-id",
            ProfileField::ApiUrl => "api-url",
        }
    }

    pub fn keys() -> Vec<&'static str> {
        Self::ALL.iter().map(|field| field.key()).collect()
    }

    pub fn is_secret(self) -> bool {
        matches!(self, ProfileField::Token)
    }

    pub fn get(self, profile: &Profile) -> Option<&str> {
        let value = match self {
            ProfileField::Username => &profile.username,
            ProfileField::Token => &profile.token,
            ProfileField::DomainId => &profile.domain_id,
            ProfileField::Region => &profile.region,
            ProfileField::ProjectId => &profile.project_id,
            ProfileField::ApiUrl => &profile.api_url,
        };

        value.as_deref().filter(|value| !value.is_empty())
    }

    pub fn slot(self, profile: &mut Profile) -> &mut Option<String> {
        match self {
            ProfileField::Username => &mut profile.username,
            ProfileField::Token => &mut profile.token,
            ProfileField::DomainId => &mut profile.domain_id,
            ProfileField::Region => &mut profile.region,
            ProfileField::ProjectId => &mut profile.project_id,
            ProfileField::ApiUrl => &mut profile.api_url,
        }
    }

    /// Value as it may be shown to a user; secrets are masked unless empty.
    pub fn display_value(self, value: &str) -> String {
        if self.is_secret() && !value.is_empty() {
            MASKED_VALUE.to_string()
        } else {
            value.to_string()
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ProfileField {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == key)
            .ok_or_else(|| Error::UnsupportedField {
                key: key.to_string(),
            })
    }
}
