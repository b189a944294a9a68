use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use snafu::ResultExt;

use super::codec::{self, ConfigDocument};
use super::lock::{FileLock, LockMode, READ_TIMEOUT, WRITE_TIMEOUT};
use super::profile::{Profile, ProfileField};
use super::{EmptyProfileNameSnafu, Error, IoSnafu, ProfileNotFoundSnafu};

/// Where a [`ConfigRepository`] reads its document from and writes it back to.
pub trait DocumentStore {
    fn read(&self) -> Result<ConfigDocument, Error>;

    fn write(&self, document: &ConfigDocument) -> Result<(), Error>;

    fn location(&self) -> &Path;
}

/// The configuration file on disk, guarded by advisory locks.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_timeout: READ_TIMEOUT,
            write_timeout: WRITE_TIMEOUT,
        }
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    fn open_for_write(&self) -> Result<File, Error> {
        let mut options = OpenOptions::new();
        // truncation happens only once the lock is held
        options.write(true).create(true).truncate(false);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        options.open(&self.path).context(IoSnafu { path: &self.path })
    }
}

impl DocumentStore for FileStore {
    fn read(&self) -> Result<ConfigDocument, Error> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(error) => return Err(error).context(IoSnafu { path: &self.path }),
        };

        let lock = FileLock::acquire(file, &self.path, LockMode::Shared, self.read_timeout)?;

        let mut bytes = Vec::new();
        lock.file()
            .read_to_end(&mut bytes)
            .context(IoSnafu { path: &self.path })?;

        codec::decode(&bytes, &self.path)
    }

    fn write(&self, document: &ConfigDocument) -> Result<(), Error> {
        let bytes = codec::encode(document)?;

        let file = self.open_for_write()?;
        let lock = FileLock::acquire(file, &self.path, LockMode::Exclusive, self.write_timeout)?;

        let mut file = lock.file();
        file.set_len(0)
            .and_then(|_| file.seek(SeekFrom::Start(0)))
            .and_then(|_| file.write_all(&bytes))
            .and_then(|_| file.sync_all())
            .context(IoSnafu { path: &self.path })?;

        log::debug!("wrote configuration file {}", self.path.display());

        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// The loaded configuration profiles of one invocation.
///
/// Every mutation is applied to a copy of the document, persisted, and only
/// then kept, so memory never runs ahead of what is on disk.
#[derive(Debug)]
pub struct ConfigRepository<S: DocumentStore = FileStore> {
    store: S,
    document: ConfigDocument,
}

impl ConfigRepository<FileStore> {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Self::from_store(FileStore::new(path))
    }
}

impl<S: DocumentStore> ConfigRepository<S> {
    /// Reads and validates the document; an unusable active profile is an error.
    pub fn from_store(store: S) -> Result<Self, Error> {
        let document = store.read()?;

        if let Err(reason) = document.validate() {
            return Err(Error::Validation {
                path: store.location().to_path_buf(),
                reason,
            });
        }

        Ok(Self { store, document })
    }

    pub fn location(&self) -> &Path {
        self.store.location()
    }

    pub fn active_profile_name(&self) -> &str {
        &self.document.active_profile
    }

    /// Profile names in sorted order.
    pub fn profile_names(&self) -> Vec<&str> {
        self.document.profiles.keys().map(String::as_str).collect()
    }

    /// Fields of `name`, or of the active profile when `name` is empty or absent.
    pub fn profile_fields(&self, name: Option<&str>) -> Result<Vec<(ProfileField, String)>, Error> {
        Ok(self.profile(name)?.fields())
    }

    pub fn profile(&self, name: Option<&str>) -> Result<&Profile, Error> {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => &self.document.active_profile,
        };

        self.document
            .profiles
            .get(name)
            .ok_or_else(|| self.profile_not_found(name))
    }

    pub fn set_active_profile(&mut self, name: &str) -> Result<(), Error> {
        if name.is_empty() {
            return EmptyProfileNameSnafu.fail();
        }
        if !self.document.profiles.contains_key(name) {
            return Err(self.profile_not_found(name));
        }

        let mut next = self.document.clone();
        next.active_profile = name.to_string();

        self.commit(next)
    }

    /// Inserts `name`, replacing every field of an existing profile with that name.
    pub fn add_or_replace_profile(&mut self, name: &str, profile: Profile) -> Result<(), Error> {
        if name.is_empty() {
            return EmptyProfileNameSnafu.fail();
        }

        let mut next = self.document.clone();
        next.profiles.insert(name.to_string(), profile);

        self.commit(next)
    }

    /// Returns `false` without touching the file when the value is already stored.
    pub fn set_active_profile_field(&mut self, key: &str, value: &str) -> Result<bool, Error> {
        let field: ProfileField = key.parse()?;

        let mut next = self.document.clone();
        let active = next.active_profile.clone();
        let profile = next
            .profiles
            .get_mut(&active)
            .ok_or_else(|| self.profile_not_found(&active))?;

        if !profile.set(field, value) {
            return Ok(false);
        }

        self.commit(next)?;
        Ok(true)
    }

    fn commit(&mut self, next: ConfigDocument) -> Result<(), Error> {
        self.store.write(&next)?;
        self.document = next;

        Ok(())
    }

    fn profile_not_found(&self, name: &str) -> Error {
        ProfileNotFoundSnafu {
            name,
            path: self.store.location(),
        }
        .build()
    }
}
