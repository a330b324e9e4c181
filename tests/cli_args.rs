//! Integration tests for the shelf binary
//!
//! Every run points `--config` at a temporary config file so that nothing
//! touches the real cache or providers directories.

use std::fs;
use std::path::Path;
use std::process::Command;

use shelf::cache::MetadataCaches;
use shelf::data::MetadataRecord;
use tempfile::TempDir;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_shelf"))
        .args(args)
        .output()
        .expect("Failed to execute shelf")
}

/// Writes a config file whose paths live inside `temp_dir`
fn write_config(temp_dir: &TempDir, ttl: &str) -> String {
    let path = temp_dir.path().join("config.toml");
    let contents = format!(
        "[paths]\ncache_dir = {:?}\nproviders_dir = {:?}\n\n[providers.cache]\nttl = {:?}\n",
        temp_dir.path().join("cache").display().to_string(),
        temp_dir.path().join("providers").display().to_string(),
        ttl,
    );
    fs::write(&path, contents).expect("Should write config");
    path.display().to_string()
}

fn write_provider(dir: &Path, name: &str) {
    fs::create_dir_all(dir).expect("Should create provider dir");
    fs::write(
        dir.join("provider.toml"),
        format!("name = \"{}\"\ntype = \"single\"\nversion = \"1.0.0\"\n", name),
    )
    .expect("Should write descriptor");
    fs::write(dir.join("main.lua"), "return {}").expect("Should write script");
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("shelf"), "Help should mention shelf");
    assert!(stdout.contains("providers"), "Help should mention providers");
    assert!(stdout.contains("cache"), "Help should mention cache");
}

#[test]
fn test_invalid_cache_prints_error_and_exits() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = write_config(&temp_dir, "24h");

    let output = run_cli(&["--config", &config, "cache", "clear", "bogus"]);

    assert!(!output.status.success(), "Expected invalid cache to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid cache"),
        "Should print error message about invalid cache: {}",
        stderr
    );
}

#[test]
fn test_cache_info_lists_every_cache() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = write_config(&temp_dir, "24h");

    let output = run_cli(&["--config", &config, "cache", "info"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["relation", "search", "id", "fail"] {
        assert!(stdout.contains(name), "Info should list {}: {}", name, stdout);
    }
    assert!(stdout.contains("never expires"));
    assert!(stdout.contains("10 days"));
}

#[test]
fn test_providers_lists_loaded_providers() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = write_config(&temp_dir, "24h");
    write_provider(&temp_dir.path().join("providers").join("alpha"), "alpha");
    write_provider(&temp_dir.path().join("providers").join("beta"), "beta");

    let output = run_cli(&["--config", &config, "providers"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("alpha"));
    assert!(stdout.contains("beta"));
    assert!(stdout.contains("2 provider(s) loaded"));
}

#[test]
fn test_providers_with_bad_ttl_exits_with_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = write_config(&temp_dir, "whenever");
    write_provider(&temp_dir.path().join("providers").join("alpha"), "alpha");

    let output = run_cli(&["--config", &config, "providers"]);

    assert!(!output.status.success(), "Bad TTL must be fatal");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("whenever"), "Should name the bad TTL: {}", stderr);
}

#[test]
fn test_where_prints_configured_paths() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = write_config(&temp_dir, "24h");

    let output = run_cli(&["--config", &config, "where"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&temp_dir.path().join("cache").display().to_string()));
    assert!(stdout.contains(&temp_dir.path().join("providers").display().to_string()));
}

#[test]
fn test_cache_lookup_prints_remembered_record() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = write_config(&temp_dir, "24h");
    let mut record = MetadataRecord::new(30013, "One Piece");
    record.title.english = Some("One Piece (EN)".to_string());
    MetadataCaches::new(&temp_dir.path().join("cache"))
        .remember(&record)
        .expect("Remember should succeed");

    let output = run_cli(&["--config", &config, "cache", "lookup", "one   piece"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("30013\tOne Piece (EN)"), "stdout: {}", stdout);
}

#[test]
fn test_cache_lookup_reports_miss() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = write_config(&temp_dir, "24h");

    let output = run_cli(&["--config", &config, "cache", "lookup", "Nothing"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Nothing is not cached"));
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use shelf::cache::CacheKind;
    use shelf::cli::{parse_cache_arg, CacheTarget, Cli, Command};

    #[test]
    fn test_cli_cache_info_parses() {
        let cli = Cli::parse_from(["shelf", "cache", "info"]);
        assert!(matches!(cli.command, Command::Cache { .. }));
    }

    #[test]
    fn test_parse_cache_arg_fail_returns_fail() {
        let result = parse_cache_arg("fail");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), CacheTarget::One(CacheKind::Fail));
    }

    #[test]
    fn test_parse_cache_arg_invalid_returns_error() {
        let result = parse_cache_arg("invalid");
        assert!(result.is_err());
    }
}
