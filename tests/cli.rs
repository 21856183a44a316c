use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::File;
use tempfile::TempDir;

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("gitlab-release").expect("Binary exists");
    cmd.env_clear();
    cmd
}

#[test]
fn help_lists_publish_command() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("publish"));
}

#[test]
fn publish_without_token_fails() {
    bin()
        .arg("publish")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PLUGIN_TOKEN"));
}

#[test]
fn dry_run_prints_plan_for_tag_build() {
    let dir = TempDir::new().unwrap();
    File::create(dir.path().join("app.tar.gz")).unwrap();

    bin()
        .args(["publish", "--dry-run"])
        .env("PLUGIN_TOKEN", "glpat-unused")
        .env("PLUGIN_ASSETS", format!("{}/*.tar.gz", dir.path().display()))
        .env("DRONE_REPO", "group/project")
        .env("DRONE_BUILD_EVENT", "tag")
        .env("DRONE_TAG", "v1.2.3")
        .env("DRONE_REMOTE_URL", "https://gitlab.example.com/group/project.git")
        .env("DRONE_COMMIT_MESSAGE", "Bump version")
        .assert()
        .success()
        .stdout(predicate::str::contains("would upload"))
        .stdout(predicate::str::contains("app.tar.gz"))
        .stdout(predicate::str::contains("https://gitlab.example.com/group/project"))
        .stdout(predicate::str::contains("*Commit message*: Bump version"));
}

#[test]
fn dry_run_refuses_non_tag_builds() {
    bin()
        .args(["publish", "--dry-run"])
        .env("PLUGIN_TOKEN", "glpat-unused")
        .env("PLUGIN_ASSETS", "*.none")
        .env("DRONE_BUILD_EVENT", "push")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Event should be tag"));
}
