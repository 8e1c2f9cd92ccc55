//! CLI integration tests for the vinculo admin commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use vinculo::auth::validate_token;
use vinculo::store::SqliteStore;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("vinculo").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args([
                "admin",
                "init",
                "--data-dir",
                &self.data_dir_str(),
                "--non-interactive",
            ])
            .assert()
    }

    fn matches(&self, subcommand: &str) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["admin", "matches", subcommand, "--data-dir", &self.data_dir_str()])
            .assert()
    }

    fn add_user_json(&self, role: &str, name: &str) -> Value {
        let output = self
            .cmd()
            .args([
                "admin",
                "user",
                "add",
                "--data-dir",
                &self.data_dir_str(),
                "--role",
                role,
                "--name",
                name,
                "--json",
            ])
            .output()
            .expect("failed to run command");

        assert!(output.status.success(), "user add failed: {output:?}");
        serde_json::from_slice(&output.stdout).expect("failed to parse JSON")
    }
}

#[test]
fn test_init_writes_admin_token() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Admin token"));

    ctx.temp_dir.child("vinculo.db").assert(predicate::path::exists());
    let token_file = ctx.temp_dir.child(".admin_token");
    token_file.assert(predicate::str::starts_with("vinculo_"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(token_file.path())
            .expect("stat token file")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn test_init_twice_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.init()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_commands_require_init() {
    let ctx = TestContext::new();

    ctx.matches("status")
        .failure()
        .stderr(predicate::str::contains("not initialized"));

    ctx.cmd()
        .args([
            "admin",
            "user",
            "add",
            "--data-dir",
            &ctx.data_dir_str(),
            "--role",
            "unsa",
            "--name",
            "Lab",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_user_add_json_token_is_valid() {
    let ctx = TestContext::new();
    ctx.init().success();

    let created = ctx.add_user_json("externo", "Minera Sur");
    assert_eq!(created["user"]["role"], "externo");
    assert_eq!(created["user"]["display_name"], "Minera Sur");

    let token = created["token"].as_str().expect("token is a string");
    let store = SqliteStore::new(ctx.data_dir().join("vinculo.db")).expect("open store");
    let validated = validate_token(&store, token).expect("token validates");
    assert_eq!(validated.user.id, created["user"]["id"].as_str().unwrap());
}

#[test]
fn test_user_add_rejects_unknown_role() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args([
            "admin",
            "user",
            "add",
            "--data-dir",
            &ctx.data_dir_str(),
            "--role",
            "researcher",
            "--name",
            "Lab",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown role"));
}

#[test]
fn test_matches_toggle_round_trip() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.matches("status")
        .success()
        .stdout(predicate::str::contains("Match system is disabled"));
    ctx.matches("enable")
        .success()
        .stdout(predicate::str::contains("Match system is enabled"));
    ctx.matches("status")
        .success()
        .stdout(predicate::str::contains("Match system is enabled"));
    ctx.matches("disable")
        .success()
        .stdout(predicate::str::contains("Match system is disabled"));
}
