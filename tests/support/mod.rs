//! Helpers shared by the CLI tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a fake build executor that records its arguments in `args.txt`
/// beside itself and exits with `exit_code`.
///
/// Returns the temporary directory and the path to the executable.
pub fn fake_make(exit_code: i32) -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new().context("fake_make: create temp dir")?;
    let path = dir.path().join("make");
    let log = dir.path().join("args.txt");
    let script = format!(
        "#!/bin/sh\necho \"$@\" > '{}'\nexit {exit_code}\n",
        log.display()
    );
    fs::write(&path, script).with_context(|| format!("fake_make: write {}", path.display()))?;
    make_executable(&path)?;
    Ok((dir, path))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).with_context(|| format!("chmod {}", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Copy the fixture `name` from `tests/data` into `dir` as `as_name`.
pub fn copy_fixture(name: &str, dir: &Path, as_name: &str) -> Result<PathBuf> {
    let dest = dir.join(as_name);
    fs::copy(Path::new("tests/data").join(name), &dest)
        .with_context(|| format!("copy {name} to {}", dest.display()))?;
    Ok(dest)
}
