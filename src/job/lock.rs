use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use jiff::{SignedDuration, Timestamp};
use log::warn;

pub const LOCK_FILE: &str = ".ocha-snapshot.lock";

/// A lock older than this is taken over, whatever its holder.
pub const STALE_AFTER: SignedDuration = SignedDuration::from_hours(6);

/// Exclusive marker for a job running in a working tree.  Removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

/// What a lock file says about the run that wrote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockHolder {
    pub pid: u32,
    pub since: Timestamp,
}

impl LockHolder {
    /// Parse `pid <PID> since <TIMESTAMP>`.
    pub fn parse(s: &str) -> Option<LockHolder> {
        let mut parts = s.split_whitespace();
        let (Some("pid"), Some(pid), Some("since"), Some(since), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return None;
        };
        Some(LockHolder {
            pid: pid.parse().ok()?,
            since: since.parse().ok()?,
        })
    }
}

impl RunLock {
    /// Fails with [`io::ErrorKind::AlreadyExists`] if another live run holds
    /// the lock.  A lock left behind by a dead process, or older than
    /// [`STALE_AFTER`], is reclaimed.
    pub fn acquire(dir: &Path) -> io::Result<RunLock> {
        let path = dir.join(LOCK_FILE);
        match RunLock::create(&path) {
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let content = fs::read_to_string(&path).unwrap_or_default();
                if !is_stale(&path, LockHolder::parse(&content), Timestamp::now()) {
                    return Err(e);
                }
                warn!("Reclaiming stale lock {:?} ({})", path, content.trim());
                fs::remove_file(&path)?;
                RunLock::create(&path)
            }
            result => result,
        }
    }

    fn create(path: &Path) -> io::Result<RunLock> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        // dropped, and the file removed, if the write fails
        let lock = RunLock {
            path: path.to_path_buf(),
        };
        writeln!(file, "pid {} since {}", std::process::id(), Timestamp::now())?;
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove lock {:?}: {}", self.path, e);
        }
    }
}

/// A lock is stale if its process is gone or it is older than
/// [`STALE_AFTER`].  Without a readable holder (the file may be mid-write)
/// only the file age counts.
fn is_stale(path: &Path, holder: Option<LockHolder>, now: Timestamp) -> bool {
    let since = match holder {
        Some(holder) => {
            if process_alive(holder.pid) == Some(false) {
                return true;
            }
            holder.since
        }
        None => match fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| Timestamp::try_from(t).ok())
        {
            Some(modified) => modified,
            None => return false,
        },
    };
    now.duration_since(since) > STALE_AFTER
}

/// `None` when there is no way to tell.
fn process_alive(pid: u32) -> Option<bool> {
    let proc = Path::new("/proc");
    if !proc.join("self").exists() {
        return None;
    }
    Some(proc.join(pid.to_string()).exists())
}
