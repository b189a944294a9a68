use std::path::Path;

use super::profile::ProfileField;
use super::repository::ConfigRepository;

/// Flags that never take a value from a profile.
pub const EXCLUDED_FLAGS: [&str; 2] = ["help", "config-path"];

/// One mergeable flag of a command: its long name and its current value.
pub struct FlagSlot<'a> {
    pub name: &'static str,
    pub value: &'a mut Option<String>,
}

impl<'a> FlagSlot<'a> {
    pub fn new(name: &'static str, value: &'a mut Option<String>) -> Self {
        Self { name, value }
    }
}

/// Implemented by argument groups whose unset flags may be filled from the active profile.
///
/// A slot that already holds a value was given on the command line or through
/// its environment variable and is left alone.
pub trait FlagSet {
    fn flag_slots(&mut self) -> Vec<FlagSlot<'_>>;
}

/// Fills unset flags from `fields`, returning the names of the flags that were filled.
pub fn merge_fields<F>(flags: &mut F, fields: &[(ProfileField, String)]) -> Vec<&'static str>
where
    F: FlagSet + ?Sized,
{
    let mut merged = Vec::new();

    for slot in flags.flag_slots() {
        if EXCLUDED_FLAGS.contains(&slot.name) || slot.value.is_some() {
            continue;
        }

        let found = fields
            .iter()
            .find(|(field, value)| field.key() == slot.name && !value.is_empty());

        if let Some((_, value)) = found {
            *slot.value = Some(value.clone());
            merged.push(slot.name);
        }
    }

    merged
}

/// Merges the active profile of the file at `path` into `flags`.
///
/// A missing or unusable configuration file is not an error here: the flags
/// are left as they are and the command carries on with what it was given.
pub fn merge_from_config<F>(flags: &mut F, path: &Path)
where
    F: FlagSet + ?Sized,
{
    let repository = match ConfigRepository::load(path) {
        Ok(repository) => repository,
        Err(error) if error.is_not_found() => {
            log::warn!("{}, using flags and environment only", error);
            return;
        }
        Err(error) => {
            log::warn!("not using configuration file: {}", error);
            return;
        }
    };

    let fields = match repository.profile_fields(None) {
        Ok(fields) => fields,
        Err(error) => {
            log::warn!("not using configuration file: {}", error);
            return;
        }
    };

    let merged = merge_fields(flags, &fields);
    if !merged.is_empty() {
        log::debug!(
            "using profile `{}` for {}",
            repository.active_profile_name(),
            merged.join(", ")
        );
    }
}
