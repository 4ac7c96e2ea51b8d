//! Scoped switching of the process working directory.
//!
//! Every stage runs inside its own directory; [`run_in`] switches there,
//! creates the directory if it does not exist yet, and restores the previous
//! working directory on every exit path, including error returns and panics
//! inside the body.
//!
//! The working directory is process-wide state, so stages must never run
//! concurrently within one process.

use crate::engine::error::SetupError;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

struct RestoreGuard {
    prior: PathBuf,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if let Err(err) = env::set_current_dir(&self.prior) {
            warn!(
                "Failed to restore working directory to '{}': {}",
                self.prior.display(),
                err
            );
        }
    }
}

/// Runs `body` with the working directory switched to `directory`.
///
/// The directory (including missing parents) is created when the switch fails
/// with `NotFound`; any other failure to enter it is fatal. `body` receives
/// the absolute path of the stage directory and its result is returned
/// unchanged.
pub fn run_in<T, F>(directory: &Path, body: F) -> Result<T, SetupError>
where
    F: FnOnce(&Path) -> Result<T, SetupError>,
{
    let directory_error = |source: io::Error| SetupError::Directory {
        path: directory.to_path_buf(),
        source,
    };

    let prior = env::current_dir().map_err(directory_error)?;

    if let Err(err) = env::set_current_dir(directory) {
        if err.kind() != io::ErrorKind::NotFound {
            return Err(directory_error(err));
        }
        fs::create_dir_all(directory).map_err(directory_error)?;
        env::set_current_dir(directory).map_err(directory_error)?;
    }

    let _guard = RestoreGuard { prior };
    let stage_dir = env::current_dir().map_err(directory_error)?;
    debug!("Entered stage directory '{}'", stage_dir.display());
    body(&stage_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn restores_working_directory_after_success() {
        let dir = tempdir().unwrap();
        let before = env::current_dir().unwrap();

        let result = run_in(dir.path(), |stage_dir| {
            assert_eq!(stage_dir, &env::current_dir().unwrap());
            Ok(42)
        });

        assert_eq!(result.unwrap(), 42);
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn restores_working_directory_after_failure() {
        let dir = tempdir().unwrap();
        let before = env::current_dir().unwrap();

        let result: Result<(), _> = run_in(dir.path(), |_| {
            Err(SetupError::MissingInput("deliberate failure"))
        });

        assert!(matches!(result, Err(SetupError::MissingInput(_))));
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn creates_missing_nested_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        let before = env::current_dir().unwrap();

        run_in(&nested, |stage_dir| {
            assert!(stage_dir.ends_with("a/b/c"));
            Ok(())
        })
        .unwrap();

        assert!(nested.is_dir());
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn entering_an_existing_directory_twice_is_idempotent() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("stage");

        run_in(&target, |_| Ok(())).unwrap();
        run_in(&target, |_| Ok(())).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    #[serial]
    #[cfg(unix)]
    fn entering_a_file_is_a_directory_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("not_a_dir");
        fs::write(&file, "x").unwrap();
        let before = env::current_dir().unwrap();

        let result: Result<(), _> = run_in(&file, |_| Ok(()));

        assert!(matches!(result, Err(SetupError::Directory { .. })));
        assert_eq!(env::current_dir().unwrap(), before);
    }
}
