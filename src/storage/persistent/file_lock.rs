//! Exclusive ownership of a store directory.
//!
//! A load drops and rewrites whole collections, so two loaders sharing a
//! directory would interleave journal entries. The first loader to open a
//! directory takes a non-blocking `flock` (or `LockFileEx` on Windows) on
//! `<dir>/.lock` and writes its pid there; later loaders are refused with a
//! message naming that pid. The lock is released when [`DirLock`] is dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{Error as IoError, ErrorKind, Result as IoResult, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::storage::traits::StorageError;

/// Name of the lock file inside a store directory.
pub const LOCK_FILE: &str = ".lock";

/// Exclusive lock on a store directory, held for the lifetime of this value.
#[derive(Debug)]
pub struct DirLock {
    _file: File,
    path: PathBuf,
}

impl DirLock {
    /// Take the lock on `dir` and record this process as its holder.
    ///
    /// # Errors
    /// - `Connection` if another loader holds the directory
    /// - `Backend` if the lock file cannot be created or written
    pub fn acquire(dir: &Path) -> Result<Self, StorageError> {
        let path = dir.join(LOCK_FILE);
        // Not truncated before locking: the current holder's pid must survive.
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StorageError::Backend(format!("create {}: {e}", path.display())))?;

        match Self::try_lock(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                let holder = read_holder(&path)
                    .map_or_else(|| "unknown pid".to_string(), |pid| format!("pid {pid}"));
                return Err(StorageError::Connection(format!(
                    "store directory {} is in use by another loader ({holder})",
                    dir.display()
                )));
            }
            Err(e) => {
                return Err(StorageError::Backend(format!("lock {}: {e}", dir.display())));
            }
        }

        Self::record_holder(&mut file)
            .map_err(|e| StorageError::Backend(format!("write {}: {e}", path.display())))?;
        debug!(dir = %dir.display(), pid = std::process::id(), "locked store directory");

        Ok(Self { _file: file, path })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record_holder(file: &mut File) -> IoResult<()> {
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.flush()
    }

    #[cfg(unix)]
    fn try_lock(file: &File) -> IoResult<()> {
        use std::os::unix::io::AsRawFd;

        let fd = file.as_raw_fd();
        // SAFETY: fd is a valid open descriptor owned by `file`.
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if result != 0 {
            let err = IoError::last_os_error();
            if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
                return Err(IoError::new(ErrorKind::WouldBlock, err));
            }
            return Err(err);
        }
        Ok(())
    }

    #[cfg(windows)]
    fn try_lock(file: &File) -> IoResult<()> {
        use std::os::windows::io::AsRawHandle;
        use windows_sys::Win32::Foundation::HANDLE;
        use windows_sys::Win32::Storage::FileSystem::{
            LockFileEx, LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY,
        };

        let handle = file.as_raw_handle() as HANDLE;
        // SAFETY: handle belongs to `file`; OVERLAPPED is plain data.
        let result = unsafe {
            let mut overlapped = std::mem::zeroed::<windows_sys::Win32::System::IO::OVERLAPPED>();
            LockFileEx(
                handle,
                LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
                0,
                1,
                0,
                &mut overlapped,
            )
        };
        if result == 0 {
            return Err(IoError::new(ErrorKind::WouldBlock, IoError::last_os_error()));
        }
        Ok(())
    }

    #[cfg(not(any(unix, windows)))]
    fn try_lock(_file: &File) -> IoResult<()> {
        Err(IoError::new(
            ErrorKind::Unsupported,
            "file locking not supported on this platform",
        ))
    }
}

/// Pid recorded by the loader holding the lock, if readable.
fn read_holder(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_records_holder_and_releases() {
        let dir = tempdir().unwrap();
        {
            let lock = DirLock::acquire(dir.path()).unwrap();
            assert_eq!(lock.path(), dir.path().join(LOCK_FILE));
            assert_eq!(read_holder(lock.path()), Some(std::process::id()));
        }
        DirLock::acquire(dir.path()).unwrap();
    }

    #[test]
    fn test_second_loader_is_told_who_holds_the_directory() {
        let dir = tempdir().unwrap();
        let _held = DirLock::acquire(dir.path()).unwrap();

        let err = DirLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
        let message = err.to_string();
        assert!(message.contains("in use by another loader"), "{message}");
        assert!(message.contains(&format!("pid {}", std::process::id())), "{message}");
    }

    #[test]
    fn test_stale_holder_is_overwritten() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(LOCK_FILE), "not a pid\n").unwrap();

        let lock = DirLock::acquire(dir.path()).unwrap();
        assert_eq!(read_holder(lock.path()), Some(std::process::id()));
    }
}
