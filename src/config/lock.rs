use std::fs::File;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::{Duration, Instant};

use fs2::FileExt;
use snafu::ResultExt;

use super::{Error, LockSnafu, LockTimeoutSnafu};

/// How often a contended lock is retried.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(250);
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// An advisory lock held on an open file, released when dropped.
///
/// The lock only serializes cooperating `cleura` processes; other programs can
/// still modify the file. The operating system drops the lock when the holding
/// process exits, so an interrupted invocation never leaves the file locked.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Polls every [`RETRY_INTERVAL`] until the lock is taken or `timeout` has elapsed.
    pub fn acquire(
        file: File,
        path: &Path,
        mode: LockMode,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let deadline = Instant::now() + timeout;
        let contended = fs2::lock_contended_error().kind();

        loop {
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };

            match attempt {
                Ok(()) => {
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    })
                }
                Err(error) if error.kind() == contended => {
                    let now = Instant::now();
                    if now >= deadline {
                        return LockTimeoutSnafu { path, timeout }.fail();
                    }

                    log::trace!("{} is locked, retrying", path.display());
                    sleep(RETRY_INTERVAL.min(deadline - now));
                }
                Err(error) => return Err(error).context(LockSnafu { path }),
            }
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(error) = FileExt::unlock(&self.file) {
            log::debug!("unable to unlock {}: {}", self.path.display(), error);
        }
    }
}
