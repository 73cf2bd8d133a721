use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

#[test]
fn insert_lookup_commit_round_trips_through_a_fresh_process() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;

    let mut write = Command::cargo_bin("txkv-cli")?;
    write
        .current_dir(dir.path())
        .arg("-c")
        .arg(dir.path().join("config.toml"))
        .arg("-n")
        .arg("--query=BEGIN\nINSERT order_key xxx\nCOMMIT\n");
    write.assert().success().stdout(predicate::str::contains("commit ok"));

    let mut read = Command::cargo_bin("txkv-cli")?;
    read.current_dir(dir.path())
        .arg("-c")
        .arg(dir.path().join("config.toml"))
        .arg("-n")
        .arg("--query=BEGIN\nLOOKUP order_key\nCOMMIT\n");
    read.assert().success().stdout(predicate::str::contains("xxx"));

    Ok(())
}

#[test]
fn abort_discards_uncommitted_writes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;

    let mut write = Command::cargo_bin("txkv-cli")?;
    write
        .current_dir(dir.path())
        .arg("-c")
        .arg(dir.path().join("config.toml"))
        .arg("-n")
        .arg("--query=BEGIN\nINSERT k v\nABORT\n");
    write.assert().success();

    let mut read = Command::cargo_bin("txkv-cli")?;
    read.current_dir(dir.path())
        .arg("-c")
        .arg(dir.path().join("config.toml"))
        .arg("-n")
        .arg("--query=BEGIN\nLOOKUP k\nCOMMIT\n");
    read.assert().success().stdout(predicate::str::contains("(not found)"));

    Ok(())
}

#[test]
fn unknown_subcommand_flag_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("txkv-cli")?;
    cmd.arg("--this-flag-does-not-exist");
    cmd.assert().failure();

    Ok(())
}
