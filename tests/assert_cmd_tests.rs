//! Integration tests for CLI execution using `assert_cmd`.
//!
//! These tests invoke the compiled binary in a scratch directory and check
//! the written Makefile, the executor invocation and the exit code and
//! message reported for each error kind.

mod support;

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use support::copy_fixture;
use tempfile::tempdir;

fn easymake() -> Result<Command> {
    let mut cmd = Command::cargo_bin("easymake").context("locate easymake binary")?;
    cmd.env_remove("EASYMAKE_FILE").env_remove("EASYMAKE_EXEC");
    Ok(cmd)
}

#[test]
fn writes_makefile_from_default_config() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    copy_fixture("project.yml", temp.path(), "easymake.yml")?;
    easymake()?.current_dir(temp.path()).assert().success();

    let makefile = fs::read_to_string(temp.path().join("Makefile")).context("read Makefile")?;
    ensure!(
        makefile.contains("all: libcore.a app\n"),
        "unexpected Makefile:\n{makefile}"
    );
    Ok(())
}

#[test]
fn falls_back_to_emake_yml() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    copy_fixture("project.yml", temp.path(), "emake.yml")?;
    easymake()?
        .current_dir(temp.path())
        .args(["-o", "build.mk"])
        .assert()
        .success();
    ensure!(temp.path().join("build.mk").exists(), "build.mk should exist");
    ensure!(!temp.path().join("Makefile").exists(), "Makefile should not exist");
    Ok(())
}

#[test]
fn just_print_writes_nothing() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    copy_fixture("project.yml", temp.path(), "easymake.yml")?;
    easymake()?
        .current_dir(temp.path())
        .arg("-n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Generated by easymake"))
        .stdout(predicate::str::contains("\tar rcs libcore.a src/core.o\n"));
    ensure!(
        !temp.path().join("Makefile").exists(),
        "--just-print should not write a Makefile"
    );
    Ok(())
}

#[test]
fn config_path_from_environment() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    let config = copy_fixture("project.yml", temp.path(), "other.yml")?;
    easymake()?
        .current_dir(temp.path())
        .env("EASYMAKE_FILE", &config)
        .arg("-n")
        .assert()
        .success()
        .stdout(predicate::str::contains("run: app\n"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn build_runs_executor_with_jobs() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    copy_fixture("project.yml", temp.path(), "easymake.yml")?;
    let (make_dir, make) = support::fake_make(0)?;
    easymake()?
        .current_dir(temp.path())
        .args(["-b", "3", "-e"])
        .arg(&make)
        .assert()
        .success();
    let args = fs::read_to_string(make_dir.path().join("args.txt")).context("read args")?;
    ensure!(args.trim() == "-j 3 -f Makefile", "unexpected args: {args}");
    Ok(())
}

#[cfg(unix)]
#[test]
fn failing_executor_is_reported() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    copy_fixture("project.yml", temp.path(), "easymake.yml")?;
    let (_make_dir, make) = support::fake_make(2)?;
    easymake()?
        .current_dir(temp.path())
        .env("EASYMAKE_EXEC", &make)
        .args(["--build", "1"])
        .assert()
        .code(19)
        .stderr(predicate::str::starts_with("ExecutorFailed: 19, "));
    ensure!(
        temp.path().join("Makefile").exists(),
        "the Makefile is written before the executor runs"
    );
    Ok(())
}

#[rstest]
#[case::cycle("cycle.yml", 13, "DependencyCycle: 13, ")]
#[case::duplicate("duplicate.yml", 12, "TargetConflict: 12, ")]
#[case::illegal_command("illegal_command.yml", 11, "CommandStringIllegal: 11, ")]
fn config_errors_exit_with_code(
    #[case] fixture: &str,
    #[case] code: i32,
    #[case] prefix: &str,
) -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    let config = copy_fixture(fixture, temp.path(), "easymake.yml")?;
    easymake()?
        .current_dir(temp.path())
        .arg("-f")
        .arg(&config)
        .assert()
        .code(code)
        .stderr(predicate::str::starts_with(prefix));
    ensure!(
        !temp.path().join("Makefile").exists(),
        "no Makefile may be written on error"
    );
    Ok(())
}

#[test]
fn cycle_message_names_the_cycle() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    copy_fixture("cycle.yml", temp.path(), "easymake.yml")?;
    easymake()?
        .current_dir(temp.path())
        .assert()
        .code(13)
        .stderr(predicate::str::contains("A -> B -> A"));
    Ok(())
}

#[test]
fn missing_config_is_reported() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    easymake()?
        .current_dir(temp.path())
        .assert()
        .code(10)
        .stderr(predicate::str::starts_with("ConfigNotFound: 10, "));
    Ok(())
}

#[test]
fn check_compiler_rejects_missing_command() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    copy_fixture("missing_compiler.yml", temp.path(), "easymake.yml")?;
    easymake()?
        .current_dir(temp.path())
        .arg("--check-complier")
        .assert()
        .code(17)
        .stderr(predicate::str::contains("/nonexistent/toolchain/bin/gcc"));
    easymake()?
        .current_dir(temp.path())
        .arg("-n")
        .assert()
        .success();
    Ok(())
}

#[test]
fn strict_archiver_rejects_versioned_llvm_ar() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    fs::write(
        temp.path().join("easymake.yml"),
        "compiler:\n  command:\n    cc: clang-14\ntargets:\n  - name: app\n    sources: [main.c]\n",
    )
    .context("write config")?;
    easymake()?
        .current_dir(temp.path())
        .arg("-n")
        .assert()
        .success()
        .stdout(predicate::str::contains("clang-14 -c main.c -o main.o"));
    easymake()?
        .current_dir(temp.path())
        .args(["-n", "--strict-archiver"])
        .assert()
        .code(11)
        .stderr(predicate::str::contains("llvm-ar-14"));
    Ok(())
}

#[test]
fn unknown_option_is_illegal() -> Result<()> {
    easymake()?
        .arg("--bogus")
        .assert()
        .code(14)
        .stderr(predicate::str::starts_with("CliOptionIllegal: 14, "));
    Ok(())
}

#[test]
fn invalid_yaml_is_config_invalid() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    fs::write(temp.path().join("easymake.yml"), "targets: [\n").context("write config")?;
    easymake()?
        .current_dir(temp.path())
        .assert()
        .code(16)
        .stderr(predicate::str::starts_with("ConfigInvalid: 16, "));
    Ok(())
}

#[test]
fn misspelled_target_key_is_config_invalid() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    fs::write(
        temp.path().join("easymake.yml"),
        "targets:\n  - name: app\n    sources: [main.c]\n    ldflag: [-static]\n",
    )
    .context("write config")?;
    easymake()?
        .current_dir(temp.path())
        .assert()
        .code(16)
        .stderr(predicate::str::starts_with("ConfigInvalid: 16, "))
        .stderr(predicate::str::contains("unknown keys targets.app.ldflag"));
    ensure!(
        !temp.path().join("Makefile").exists(),
        "no Makefile should be written"
    );
    Ok(())
}

#[test]
fn version_flag_prints_version() -> Result<()> {
    easymake()?
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}
