//! Integration tests for the kamek binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use kamek::download::DEFAULT_FALLBACK_URL;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A command whose user directories all live under `home`.
fn kamek(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("kamek"));
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_CACHE_HOME", home.path().join("cache"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env_remove("KAMEK_CONFIG")
        .env_remove("RUST_LOG")
        .current_dir(home.path());
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("NSMBW"))
        .stdout(predicate::str::contains("resolve-url"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn upgrade_help_lists_target_flag() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .args(["upgrade", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--to <TOKEN>"))
        .stdout(predicate::str::contains("--version"));
    Ok(())
}

#[test]
fn workflow_logs_stay_out_of_default_stderr() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .args(["--non-interactive", "resolve-url", "abc", "--os", "windows"])
        .assert()
        .success()
        .stderr(predicate::str::contains("invalid_version"))
        .stderr(predicate::str::contains("Using fallback installer URL").not());

    kamek(&home)
        .args(["--debug", "--non-interactive", "resolve-url", "abc", "--os", "windows"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Using fallback installer URL"));
    Ok(())
}

#[test]
fn resolve_url_passes_through_explicit_url() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let url = "https://mirror.example.com/python-3.12.4-amd64.exe";
    kamek(&home)
        .args(["resolve-url", url])
        .assert()
        .success()
        .stdout(predicate::str::contains(url));
    Ok(())
}

#[test]
fn resolve_url_unparseable_token_prints_fallback() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .args(["--non-interactive", "resolve-url", "abc", "--os", "windows"])
        .assert()
        .success()
        .stdout(predicate::str::contains(DEFAULT_FALLBACK_URL));
    Ok(())
}

#[test]
fn resolve_url_offline_latest_prints_fallback() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .args(["resolve-url", "latest", "--offline", "--os", "windows"])
        .assert()
        .success()
        .stdout(predicate::str::contains(DEFAULT_FALLBACK_URL));
    Ok(())
}

#[test]
fn resolve_url_json_reports_fallback_flag() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .args(["resolve-url", "abc", "--os", "windows", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"is_fallback\": true"));
    Ok(())
}

#[test]
fn resolve_url_uses_project_fallback() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let project = TempDir::new()?;
    let kamek_dir = project.path().join(".kamek");
    fs::create_dir_all(&kamek_dir)?;
    fs::write(
        kamek_dir.join("config.yml"),
        "upgrade:\n  fallback_url: https://mirror.example.com/fallback.exe\n",
    )?;

    kamek(&home)
        .arg("--project")
        .arg(project.path())
        .args(["resolve-url", "abc", "--os", "windows"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://mirror.example.com/fallback.exe"));
    Ok(())
}

#[test]
fn completions_bash() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kamek"));
    Ok(())
}

#[test]
fn completions_ignore_broken_config() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .args(["--config", "missing.yml", "completions", "zsh"])
        .assert()
        .success();
    Ok(())
}

#[cfg(unix)]
#[test]
fn info_show_data_dir_creates_directory() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let expected = home.path().join("data").join("kamek");

    kamek(&home)
        .args(["info", "--show-data-dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.to_string_lossy().to_string()));

    assert!(expected.is_dir());
    Ok(())
}

#[test]
fn info_check_admin_prints_boolean() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .args(["info", "--check-admin"])
        .assert()
        .success()
        .stdout(predicate::str::is_match("^(true|false)\\s*$")?);
    Ok(())
}

#[test]
fn missing_config_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .args(["--non-interactive", "--config", "missing.yml", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.yml"));
    Ok(())
}

#[test]
fn malformed_config_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let config = home.path().join("broken.yml");
    fs::write(&config, "python: [unclosed")?;

    kamek(&home)
        .arg("--non-interactive")
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .failure();
    Ok(())
}

#[test]
fn unknown_subcommand_fails() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home).arg("frobnicate").assert().failure();
    Ok(())
}

#[test]
fn suite_url_requires_install() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    kamek(&home)
        .args(["suite", "--url", "https://example.com/updater.zip"])
        .assert()
        .failure();
    Ok(())
}
