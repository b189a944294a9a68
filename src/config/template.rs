use std::fs;
use std::path::{Path, PathBuf};

use snafu::ResultExt;

use super::{choose_path, ConfigDocument, CreateDirectorySnafu, DocumentStore, Error, FileStore};

/// Writes a configuration file holding one empty, active `default` profile.
///
/// An existing file at the destination is overwritten.
pub fn generate(output: Option<&Path>) -> Result<PathBuf, Error> {
    let path = choose_path(output)?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context(CreateDirectorySnafu { path: parent })?;
    }

    FileStore::new(&path).write(&ConfigDocument::template())?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigRepository, DEFAULT_PROFILE_NAME};
    use tempfile::tempdir;

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("nested").join("cleura").join("config");

        let path = generate(Some(&output)).unwrap();
        assert_eq!(path, output);

        let repository = ConfigRepository::load(&path).unwrap();
        assert_eq!(repository.active_profile_name(), DEFAULT_PROFILE_NAME);
        assert_eq!(repository.profile_names(), vec![DEFAULT_PROFILE_NAME]);
        assert!(repository
            .profile_fields(None)
            .unwrap()
            .iter()
            .all(|(_, value)| value.is_empty()));
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("config");
        fs::write(
            &output,
            "active_profile: staging\nprofiles:\n  staging:\n    token: s3cr3t\n    region: kna1\n",
        )
        .unwrap();

        generate(Some(&output)).unwrap();

        let contents = fs::read_to_string(&output).unwrap();
        assert!(contents.contains("active_profile: default"));
        assert!(!contents.contains("staging"));
        assert!(!contents.contains("s3cr3t"));
    }

    #[test]
    fn shorter_template_leaves_no_trailing_bytes() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("config");
        fs::write(&output, "x".repeat(4096)).unwrap();

        generate(Some(&output)).unwrap();

        let contents = fs::read(&output).unwrap();
        assert!(contents.len() < 4096);
        assert!(!contents.contains(&b'x'));
    }
}
