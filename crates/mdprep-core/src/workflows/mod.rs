//! # Workflows Module
//!
//! One entry point per pipeline stage. Each stage resolves its inputs to
//! absolute paths, switches into its own directory, drives the external
//! toolchain, and returns a result descriptor whose paths the next stage
//! consumes.
//!
//! Default chaining: [`minimize`] reads the solvation stage's ionized
//! structure, [`md::restrained`] reads the minimized structure, and
//! [`md::production`] reads the restrained run's final coordinates. Every
//! default can be overridden through the stage's configuration, so stages can
//! also run independently or against externally produced structures.
//!
//! Stages mutate the process working directory and must not run concurrently
//! within one process.

pub mod md;
pub mod minimize;
pub mod solvate;

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::path::{Path, PathBuf};

    /// A `gmx` stand-in for workflow tests.
    ///
    /// Observable behavior only: every subcommand creates its `-o` file;
    /// `grompp` reports the charge stored in `qtot.txt` (0 when absent);
    /// `genion` records its arguments and stdin, then rewrites `qtot.txt`
    /// with `GMX_STUB_RESIDUAL` (default 0); `mdrun` creates the `-c` file.
    const STUB_GMX: &str = r#"#!/bin/sh
sub="$1"; shift
out=""; final=""
prev=""
for arg in "$@"; do
  case "$prev" in
    -o) out="$arg" ;;
    -c) final="$arg" ;;
  esac
  prev="$arg"
done
case "$sub" in
  grompp)
    [ -n "$out" ] && : > "$out"
    qtot=0
    [ -f qtot.txt ] && qtot=$(cat qtot.txt)
    if [ "$qtot" != "0" ]; then
      echo "System has non-zero total charge: $qtot" >&2
    fi
    ;;
  genion)
    [ -n "$out" ] && : > "$out"
    echo "$@" > genion.args
    cat > genion.stdin
    echo "${GMX_STUB_RESIDUAL:-0}" > qtot.txt
    ;;
  mdrun)
    [ -n "$final" ] && : > "$final"
    ;;
  *)
    [ -n "$out" ] && : > "$out"
    ;;
esac
exit 0
"#;

    pub fn write_stub_gmx(dir: &Path) -> PathBuf {
        let path = dir.join("gmx-stub");
        fs::write(&path, STUB_GMX).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }

    /// Restores the working directory the test started in, even when the
    /// test body panics.
    pub struct CwdGuard {
        original: PathBuf,
    }

    impl CwdGuard {
        pub fn enter(dir: &Path) -> Self {
            let original = std::env::current_dir().unwrap();
            std::env::set_current_dir(dir).unwrap();
            Self { original }
        }
    }

    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.original);
        }
    }
}
