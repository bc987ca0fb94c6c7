//! `grep` and `ls-files` across every mirror under `current/`

use std::io;
use tracing::debug;

use crate::git::GitClient;
use crate::layout::MirrorLayout;
use crate::output::highlight;

/// Options shared by both search commands
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Ref to search; the detected main branch of each mirror when `None`
    pub reference: Option<String>,
    /// Limit to these paths
    pub files: Vec<String>,
    /// Highlight directory prefixes and ask git for colored matches
    pub color: bool,
}

/// Prefix every line with the mirror's directory name
fn prefixed(dir: &str, lines: Vec<String>, color: bool) -> impl Iterator<Item = String> {
    let prefix = highlight(dir, color);
    lines
        .into_iter()
        .map(move |line| format!("{}:{}", prefix, line))
}

async fn reference_for(
    git: &GitClient,
    repo: &std::path::Path,
    options: &SearchOptions,
) -> io::Result<String> {
    match &options.reference {
        Some(reference) => Ok(reference.clone()),
        None => git.main_branch_name(repo).await,
    }
}

/// `git grep -E PATTERN` in every mirror
///
/// Lines are handed to `emit` one mirror at a time, prefixed with the
/// directory name. Returns the number of lines emitted.
pub async fn grep(
    git: &GitClient,
    layout: &MirrorLayout,
    pattern: &str,
    options: &SearchOptions,
    mut emit: impl FnMut(String),
) -> io::Result<usize> {
    let current = layout.current();
    let mut emitted = 0;

    for dir in layout.current_entries()? {
        let repo = current.join(&dir);
        let reference = reference_for(git, &repo, options).await?;
        debug!("grep {} at {}", dir, reference);

        let lines = git
            .grep(&repo, pattern, &reference, &options.files, options.color)
            .await?;
        for line in prefixed(&dir, lines, options.color) {
            emit(line);
            emitted += 1;
        }
    }

    Ok(emitted)
}

/// Tracked file names in every mirror, emitted like [`grep`]
pub async fn ls_files(
    git: &GitClient,
    layout: &MirrorLayout,
    options: &SearchOptions,
    mut emit: impl FnMut(String),
) -> io::Result<usize> {
    let current = layout.current();
    let mut emitted = 0;

    for dir in layout.current_entries()? {
        let repo = current.join(&dir);
        let reference = reference_for(git, &repo, options).await?;
        debug!("ls-files {} at {}", dir, reference);

        let lines = git.ls_files(&repo, &reference, &options.files).await?;
        for line in prefixed(&dir, lines, options.color) {
            emit(line);
            emitted += 1;
        }
    }

    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prefixed_lines() {
        let lines = vec!["main:README.md:hit".to_string(), "main:src/lib.rs:hit".to_string()];
        assert_eq!(
            prefixed("tool.git", lines, false).collect::<Vec<_>>(),
            vec!["tool.git:main:README.md:hit", "tool.git:main:src/lib.rs:hit"]
        );
    }

    #[tokio::test]
    async fn test_empty_mirror_tree_yields_nothing() {
        let temp = TempDir::new().unwrap();
        let layout = MirrorLayout::new(temp.path(), "nobody");
        let git = GitClient::default();

        let mut seen = Vec::new();
        let options = SearchOptions::default();

        let count = grep(&git, &layout, "x", &options, |line| seen.push(line))
            .await
            .unwrap();
        assert_eq!(count, 0);

        let count = ls_files(&git, &layout, &options, |line| seen.push(line))
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(seen.is_empty());
    }
}
