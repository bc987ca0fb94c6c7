use std::io;
use std::path::{Path, PathBuf};

/// On-disk mirror tree for one owner: `{root}/{owner}/current` and
/// `{root}/{owner}/abandoned`
#[derive(Debug, Clone)]
pub struct MirrorLayout {
    base: PathBuf,
}

impl MirrorLayout {
    pub fn new(root: impl AsRef<Path>, owner: &str) -> Self {
        Self {
            base: root.as_ref().join(owner),
        }
    }

    pub fn current(&self) -> PathBuf {
        self.base.join("current")
    }

    pub fn abandoned(&self) -> PathBuf {
        self.base.join("abandoned")
    }

    pub fn ensure_current(&self) -> io::Result<PathBuf> {
        let current = self.current();
        std::fs::create_dir_all(&current)?;
        Ok(current)
    }

    pub fn ensure_abandoned(&self) -> io::Result<PathBuf> {
        let abandoned = self.abandoned();
        std::fs::create_dir_all(&abandoned)?;
        Ok(abandoned)
    }

    /// Entry names under `current/`, sorted; empty when it does not exist yet
    pub fn current_entries(&self) -> io::Result<Vec<String>> {
        let current = self.current();
        if !current.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&current)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
