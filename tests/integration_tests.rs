//! Integration tests for the ghmirror CLI
//! These tests run the actual binary and verify its behavior

mod common;

use assert_fs::prelude::*;
use common::{bare_upstream, dir_entries, git_available, repo_json, TestEnvironment};
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ghmirror() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ghmirror"));
    command
        .env("GHMIRROR_TEST_TOKEN", "ghp_integration")
        .env_remove("RUST_LOG");
    command
}

async fn run(args: &[&str], config: Option<&Path>) -> Output {
    let mut command = ghmirror();
    if let Some(config) = config {
        command.arg("--config").arg(config);
    }
    command
        .args(args)
        .output()
        .await
        .expect("Failed to execute ghmirror")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[tokio::test]
async fn test_cli_help() {
    let output = run(&["--help"], None).await;

    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["list", "fetch", "abandon", "grep", "ls-files"] {
        assert!(text.contains(command), "help is missing {command}");
    }
    assert!(text.contains("--archived"));
    assert!(text.contains("--path"));
}

#[tokio::test]
async fn test_no_subcommand_prints_help() {
    let output = run(&[], None).await;

    assert!(output.status.success());
    assert!(predicate::str::contains("Usage").eval(&stdout(&output)));
}

#[tokio::test]
async fn test_cli_version() {
    let output = run(&["--version"], None).await;

    assert!(output.status.success());
    assert!(stdout(&output).contains("ghmirror"));
}

#[tokio::test]
async fn test_list_formats_each_repository() {
    let env = TestEnvironment::new();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .and(header("authorization", "token ghp_integration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            repo_json("one", "https://github.com/acme/one.git", false),
            repo_json("two", "https://github.com/acme/two.git", false),
            repo_json("old", "https://github.com/acme/old.git", true),
        ])))
        .mount(&server)
        .await;
    let config = env.create_config(&server.uri());

    let output = run(&["acme", "list"], Some(&config)).await;
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "https://github.com/acme/one.git\nhttps://github.com/acme/two.git\n"
    );

    let output = run(
        &["acme", "list", "--archived", "-f", "%(full_name)s archived=%(archived)s"],
        Some(&config),
    )
    .await;
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "acme/one archived=false\nacme/two archived=false\nacme/old archived=true\n"
    );
}

#[tokio::test]
async fn test_list_unknown_format_key_fails() {
    let env = TestEnvironment::new();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([repo_json(
            "one",
            "https://github.com/acme/one.git",
            false
        )])))
        .mount(&server)
        .await;
    let config = env.create_config(&server.uri());

    let output = run(&["acme", "list", "-f", "%(nope)s"], Some(&config)).await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope"));
}

#[tokio::test]
async fn test_api_error_exits_nonzero() {
    let env = TestEnvironment::new();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let config = env.create_config(&server.uri());

    let output = run(&["acme", "fetch"], Some(&config)).await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("401"));
    assert!(!env.current("acme").exists());
}

async fn mount_listing_once(server: &MockServer, listing: &serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing.clone()))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_abandon_and_grep_with_real_git() {
    if !git_available() {
        return;
    }

    let env = TestEnvironment::new();
    let upstreams = env.temp_dir.path().join("upstreams");
    std::fs::create_dir_all(&upstreams).unwrap();
    let widget = bare_upstream(&upstreams, "widget", "README.md", "find the needle\n");
    let gadget = bare_upstream(&upstreams, "gadget", "notes.txt", "no match here\n");

    let listing = json!([
        repo_json("widget", widget.to_str().unwrap(), false),
        repo_json("gadget", gadget.to_str().unwrap(), false),
    ]);
    let server = MockServer::start().await;
    let config = env.create_config(&server.uri());

    std::fs::create_dir_all(env.current("acme").join("retired.git")).unwrap();

    // fetch lists once and retires against that same listing
    mount_listing_once(&server, &listing).await;
    let output = run(&["acme", "fetch"], Some(&config)).await;
    server.verify().await;
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("widget.git"));
    assert!(text.contains("gadget.git"));
    assert!(text.contains("retired.git abandoned"));

    assert_eq!(
        dir_entries(&env.current("acme")),
        vec!["gadget.git", "widget.git"]
    );
    assert_eq!(dir_entries(&env.abandoned("acme")), vec!["retired.git"]);

    // A second run fetches the existing mirrors and abandons nothing
    server.reset().await;
    mount_listing_once(&server, &listing).await;
    let output = run(&["acme", "fetch"], Some(&config)).await;
    server.verify().await;
    assert!(output.status.success());
    assert!(!stdout(&output).contains("abandoned"));

    // Searching reads only the mirror tree
    server.reset().await;
    let output = run(&["acme", "grep", "needle"], Some(&config)).await;
    assert!(output.status.success());
    assert_eq!(stdout(&output), "widget.git:main:README.md:find the needle\n");

    let output = run(&["acme", "ls-files"], Some(&config)).await;
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "gadget.git:notes.txt\nwidget.git:README.md\n"
    );
}

#[tokio::test]
async fn test_init_writes_config() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("nested").child("config.yml");

    let output = run(&["-p", "/srv/mirrors", "init"], Some(config.path())).await;

    assert!(output.status.success());
    config.assert(predicate::path::exists());
    config.assert(predicate::str::contains("mirror_root: /srv/mirrors"));
}
