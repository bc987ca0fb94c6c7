use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

/// The two version-control operations the sync engine relies on
///
/// Implementations report only failures to launch the tool. What the tool
/// itself does (its exit status and output) goes straight to the terminal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MirrorOperations: Send + Sync {
    /// Mirror-clone `url` into `workdir/dir`
    async fn clone_mirror(&self, url: &str, workdir: &Path, dir: &str) -> io::Result<()>;

    /// Fetch all refs of an existing mirror, pruning refs deleted upstream
    async fn fetch_prune(&self, repo: &Path) -> io::Result<()>;
}

/// Runs the external `git` executable
#[derive(Debug, Clone)]
pub struct GitClient {
    program: String,
}

impl Default for GitClient {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> AsyncCommand {
        AsyncCommand::new(&self.program)
    }

    /// `main` or `master` when such a branch exists, otherwise `HEAD`
    pub async fn main_branch_name(&self, repo: &Path) -> io::Result<String> {
        let output = self
            .command()
            .arg("--no-pager")
            .arg("-C")
            .arg(repo)
            .args(["branch", "--list"])
            .output()
            .await?;

        let branches = String::from_utf8_lossy(&output.stdout);
        Ok(pick_main_branch(branches.lines()).to_string())
    }

    /// `git grep -E` at a ref, returning the matching lines
    pub async fn grep(
        &self,
        repo: &Path,
        pattern: &str,
        reference: &str,
        files: &[String],
        color: bool,
    ) -> io::Result<Vec<String>> {
        let mut command = self.command();
        command.arg("-C").arg(repo).arg("grep");
        if color {
            command.arg("--color=always");
        }
        command
            .arg("-E")
            .arg("-e")
            .arg(pattern)
            .arg(reference)
            .arg("--")
            .args(files);

        self.captured_lines(command).await
    }

    /// Tracked file names at a ref, optionally limited to `files`
    pub async fn ls_files(
        &self,
        repo: &Path,
        reference: &str,
        files: &[String],
    ) -> io::Result<Vec<String>> {
        let mut command = self.command();
        command
            .arg("-C")
            .arg(repo)
            .args(["ls-tree", "--full-tree", "-r", "--name-only"])
            .arg(reference)
            .args(files);

        self.captured_lines(command).await
    }

    async fn captured_lines(&self, mut command: AsyncCommand) -> io::Result<Vec<String>> {
        let output = command.stderr(Stdio::inherit()).output().await?;
        debug!("git exited with {}", output.status);

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl MirrorOperations for GitClient {
    async fn clone_mirror(&self, url: &str, workdir: &Path, dir: &str) -> io::Result<()> {
        let status = self
            .command()
            .args(["clone", "--mirror", url, dir])
            .current_dir(workdir)
            .status()
            .await?;

        debug!("git clone --mirror {} exited with {}", url, status);
        Ok(())
    }

    async fn fetch_prune(&self, repo: &Path) -> io::Result<()> {
        let status = self
            .command()
            .arg("-C")
            .arg(repo)
            .args(["fetch", "--all", "--prune"])
            .status()
            .await?;

        debug!("git fetch in {} exited with {}", repo.display(), status);
        Ok(())
    }
}

/// Pick the main branch from `git branch --list` output
fn pick_main_branch<'a>(lines: impl Iterator<Item = &'a str>) -> &'static str {
    let mut has_master = false;

    for line in lines {
        match line.trim_start_matches(['*', ' ']) {
            "main" => return "main",
            "master" => has_master = true,
            _ => {}
        }
    }

    if has_master {
        "master"
    } else {
        "HEAD"
    }
}
