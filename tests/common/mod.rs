//! Common test utilities and helpers for ghmirror tests
#![allow(dead_code)]

use async_trait::async_trait;
use ghmirror::MirrorOperations;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use tempfile::TempDir;

/// Scratch area holding a config file and a mirror root
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub mirror_root: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mirror_root = temp_dir.path().join("repos");
        std::fs::create_dir_all(&mirror_root).expect("Failed to create mirror root");

        Self {
            temp_dir,
            mirror_root,
        }
    }

    /// Config pointing at a mock API, with only the environment token source
    pub fn create_config(&self, api_root: &str) -> PathBuf {
        let config_path = self.temp_dir.path().join("config.yml");
        let content = format!(
            r#"
mirror_root: "{}"
github:
  api_root: "{}"
auth:
  script: null
  token_env: "GHMIRROR_TEST_TOKEN"
  use_gh_cli: false
"#,
            self.mirror_root.display(),
            api_root
        );
        std::fs::write(&config_path, content).expect("Failed to write test config");
        config_path
    }

    pub fn current(&self, owner: &str) -> PathBuf {
        self.mirror_root.join(owner).join("current")
    }

    pub fn abandoned(&self, owner: &str) -> PathBuf {
        self.mirror_root.join(owner).join("abandoned")
    }
}

/// API document for one repository
pub fn repo_json(name: &str, clone_url: &str, archived: bool) -> Value {
    json!({
        "name": name,
        "full_name": format!("acme/{name}"),
        "clone_url": clone_url,
        "archived": archived,
        "private": false
    })
}

/// Sorted entry names of a directory
pub fn dir_entries(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(path) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

/// Stands in for git: clones create the directory, fetches are recorded
#[derive(Default)]
pub struct FakeGit {
    pub cloned: Mutex<Vec<String>>,
    pub fetched: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl MirrorOperations for FakeGit {
    async fn clone_mirror(&self, url: &str, workdir: &Path, dir: &str) -> io::Result<()> {
        std::fs::create_dir(workdir.join(dir))?;
        self.cloned.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn fetch_prune(&self, repo: &Path) -> io::Result<()> {
        self.fetched.lock().unwrap().push(repo.to_path_buf());
        Ok(())
    }
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {:?} failed", args);
}

/// Create a bare upstream repository `{parent}/{name}.git` holding one file
/// on `main`, returning its path (usable as a clone URL)
pub fn bare_upstream(parent: &Path, name: &str, file: &str, content: &str) -> PathBuf {
    let work = parent.join(format!("{name}-work"));
    std::fs::create_dir_all(&work).unwrap();
    git(&work, &["init", "--quiet"]);
    git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    std::fs::write(work.join(file), content).unwrap();
    git(&work, &["add", "."]);
    git(&work, &["commit", "--quiet", "-m", "initial"]);

    let bare = parent.join(format!("{name}.git"));
    git(
        parent,
        &[
            "clone",
            "--quiet",
            "--bare",
            work.to_str().unwrap(),
            bare.to_str().unwrap(),
        ],
    );
    bare
}
