use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{FsError, FsResult};

/// Session-scoped state: the directory every relative argument is resolved against.
///
/// The stored path is always canonical and always names an existing directory; it is only
/// replaced after the new target has been validated.
#[derive(Debug)]
pub struct Session {
    current_dir: PathBuf,
    sync_process_dir: bool,
}

impl Session {
    /// Starts a session in the process working directory.
    pub fn from_process_dir() -> FsResult<Self> {
        let dir = env::current_dir().map_err(|err| FsError::io("read", ".", err))?;
        let mut session = Session::at(&dir)?;
        session.sync_process_dir = true;
        Ok(session)
    }

    /// Starts a session rooted at `dir` without touching the process working directory.
    pub fn at(dir: &Path) -> FsResult<Self> {
        let current_dir = canonical_dir(dir)?;
        Ok(Session {
            current_dir,
            sync_process_dir: false,
        })
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Joins `name` onto the current directory; absolute names are returned unchanged.
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.current_dir.join(name)
    }

    pub fn change_dir(&mut self, target: &str) -> FsResult<&Path> {
        let new_dir = canonical_dir(&self.resolve(target))?;

        if self.sync_process_dir {
            if let Err(err) = env::set_current_dir(&new_dir) {
                warn!(
                    path = %new_dir.display(),
                    error = %err,
                    "failed to update process working directory"
                );
            }
        }

        debug!(from = %self.current_dir.display(), to = %new_dir.display(), "changed directory");
        self.current_dir = new_dir;
        Ok(&self.current_dir)
    }
}

fn canonical_dir(path: &Path) -> FsResult<PathBuf> {
    let metadata = fs::metadata(path).map_err(|err| FsError::from_io("inspect", path, err))?;
    if !metadata.is_dir() {
        return Err(FsError::NotADirectory(path.to_path_buf()));
    }
    fs::canonicalize(path).map_err(|err| FsError::io("resolve", path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cd_into_child_and_back_restores_directory() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("child")).unwrap();
        let mut session = Session::at(root.path()).unwrap();
        let original = session.current_dir().to_path_buf();

        session.change_dir("child").unwrap();
        assert_eq!(original.join("child"), session.current_dir());

        session.change_dir("..").unwrap();
        assert_eq!(original, session.current_dir());
    }

    #[test]
    fn cd_to_missing_directory_keeps_state() {
        let root = tempdir().unwrap();
        let mut session = Session::at(root.path()).unwrap();
        let original = session.current_dir().to_path_buf();

        let err = session.change_dir("nope").unwrap_err();
        assert!(matches!(err, FsError::NotFound(_)));
        assert_eq!(original, session.current_dir());
    }

    #[test]
    fn cd_to_file_is_rejected() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("plain.txt"), b"x").unwrap();
        let mut session = Session::at(root.path()).unwrap();

        let err = session.change_dir("plain.txt").unwrap_err();
        assert!(matches!(err, FsError::NotADirectory(_)));
    }

    #[test]
    fn absolute_arguments_replace_current_directory() {
        let root = tempdir().unwrap();
        let other = tempdir().unwrap();
        let mut session = Session::at(root.path()).unwrap();

        session.change_dir(other.path().to_str().unwrap()).unwrap();
        assert_eq!(
            fs::canonicalize(other.path()).unwrap(),
            session.current_dir()
        );
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_parent_is_an_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempdir().unwrap();
        let locked = root.path().join("locked");
        fs::create_dir_all(locked.join("child")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind root.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = Session::at(&locked.join("child"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result.unwrap_err(), FsError::Io { .. }));
    }
}
