// Single-instance locking
//
// An advisory exclusive lock on a well-known file, held for the owning
// process's lifetime. The OS releases the lock when the owner dies, so a
// leftover file from a crashed process is simply re-lockable: "exists but
// lockable" IS the stale state, and acquiring it reclaims it. The PID
// written inside is informational, for log forensics.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Outcome of an acquisition attempt.
#[derive(Debug)]
pub enum LockState {
    Acquired(InstanceLock),
    /// Another live process holds the lock. `pid` is whatever that process
    /// recorded, if readable.
    AlreadyRunning { pid: Option<u32> },
}

/// An exclusive lock held until dropped or released.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Try to acquire the lock at `path`, writing our PID into it on success.
    pub fn acquire(path: &Path) -> Result<LockState> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create lock directory: {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            let pid = read_pid(&mut file);
            return Ok(LockState::AlreadyRunning { pid });
        }

        // Lock held from here on; replace whatever a dead owner left behind
        file.set_len(0)
            .with_context(|| format!("Failed to truncate lock file: {}", path.display()))?;
        file.seek(SeekFrom::Start(0))?;
        write!(file, "{}", std::process::id())
            .with_context(|| format!("Failed to write PID to lock file: {}", path.display()))?;
        file.flush()?;

        Ok(LockState::Acquired(InstanceLock {
            file,
            path: path.to_path_buf(),
        }))
    }

    /// Check whether `path` is currently locked by a live process, without
    /// keeping any lock. Used by the watcher to probe client liveness.
    pub fn is_held(path: &Path) -> bool {
        let Ok(file) = OpenOptions::new().read(true).write(true).open(path) else {
            // Missing or unopenable file: nothing is holding it
            return false;
        };

        match file.try_lock_exclusive() {
            Ok(()) => {
                let _ = fs2::FileExt::unlock(&file);
                false
            }
            Err(_) => true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock and remove the file.
    pub fn release(self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

fn read_pid(file: &mut File) -> Option<u32> {
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    contents.trim().parse().ok()
}

/// Whether a process with the given PID is still alive. Best-effort,
/// for diagnostics only; the lock itself is what decides correctness.
#[cfg(unix)]
pub fn process_is_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

/// Conservative fallback: a held lock is assumed to have a live owner.
#[cfg(not(unix))]
pub fn process_is_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_writes_pid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("watcher.lock");

        let state = InstanceLock::acquire(&path).unwrap();
        let LockState::Acquired(lock) = state else {
            panic!("expected to acquire a fresh lock");
        };

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), std::process::id().to_string());
        drop(lock);
    }

    #[test]
    fn second_acquire_reports_holder_pid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("watcher.lock");

        let first = InstanceLock::acquire(&path).unwrap();
        let LockState::Acquired(_held) = first else {
            panic!("expected to acquire");
        };

        match InstanceLock::acquire(&path).unwrap() {
            LockState::AlreadyRunning { pid } => {
                assert_eq!(pid, Some(std::process::id()));
            }
            LockState::Acquired(_) => panic!("lock should be contended"),
        }
    }

    #[test]
    fn stale_file_is_reclaimed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("watcher.lock");

        // A dead process's leftover: file with a PID but no lock held
        std::fs::write(&path, "999999").unwrap();

        match InstanceLock::acquire(&path).unwrap() {
            LockState::Acquired(lock) => {
                let contents = std::fs::read_to_string(&path).unwrap();
                assert_eq!(contents.trim(), std::process::id().to_string());
                drop(lock);
            }
            LockState::AlreadyRunning { .. } => panic!("stale lock should be reclaimable"),
        }
    }

    #[test]
    fn release_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("watcher.lock");

        let LockState::Acquired(lock) = InstanceLock::acquire(&path).unwrap() else {
            panic!("expected to acquire");
        };
        lock.release();

        assert!(!path.exists());
        // And re-acquirable afterwards
        assert!(matches!(
            InstanceLock::acquire(&path).unwrap(),
            LockState::Acquired(_)
        ));
    }

    #[test]
    fn is_held_tracks_lock_lifetime() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("client.lock");

        assert!(!InstanceLock::is_held(&path));

        let LockState::Acquired(lock) = InstanceLock::acquire(&path).unwrap() else {
            panic!("expected to acquire");
        };
        assert!(InstanceLock::is_held(&path));

        lock.release();
        assert!(!InstanceLock::is_held(&path));
    }

    #[cfg(unix)]
    #[test]
    fn own_process_is_alive() {
        assert!(process_is_alive(std::process::id()));
    }
}
