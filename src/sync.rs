//! Sync Engine - clones missing mirrors and fetches existing ones in parallel
//!
//! Every repository of a catalog becomes one unit of work. Work runs behind a
//! semaphore with a fixed number of permits and `synchronize` returns only
//! after every unit has finished. What git does with each repository is its
//! own business: exit statuses are not inspected, only failures to launch the
//! tool are logged and counted.

use futures::stream::{FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::git::MirrorOperations;
use crate::layout::MirrorLayout;
use crate::output::highlight;
use crate::repository::RepositoryRecord;

/// Default number of concurrent clone/fetch operations
pub const DEFAULT_MAX_PARALLEL: usize = 20;

/// What was dispatched for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Cloned { dir: String },
    Fetched { dir: String },
    /// git could not be started at all
    LaunchFailed { dir: String, error: String },
}

/// Results from a complete synchronize pass
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub total_repositories: usize,
    pub cloned: usize,
    pub fetched: usize,
    pub launch_failures: usize,
    pub duration: Duration,
    pub actions: Vec<SyncAction>,
}

impl SyncSummary {
    fn compile(actions: Vec<SyncAction>, duration: Duration) -> Self {
        let mut cloned = 0;
        let mut fetched = 0;
        let mut launch_failures = 0;

        for action in &actions {
            match action {
                SyncAction::Cloned { .. } => cloned += 1,
                SyncAction::Fetched { .. } => fetched += 1,
                SyncAction::LaunchFailed { .. } => launch_failures += 1,
            }
        }

        Self {
            total_repositories: actions.len(),
            cloned,
            fetched,
            launch_failures,
            duration,
            actions,
        }
    }
}

/// Drives clone-or-fetch over a catalog
#[derive(Clone)]
pub struct SyncEngine {
    git: Arc<dyn MirrorOperations>,
    max_parallel: usize,
    highlight: bool,
}

impl SyncEngine {
    pub fn new(git: Arc<dyn MirrorOperations>, max_parallel: usize) -> Self {
        Self {
            git,
            max_parallel: max_parallel.max(1),
            highlight: false,
        }
    }

    /// Print directory names highlighted
    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Clone or fetch every repository of the catalog under `current/`
    ///
    /// Creating `current/` is the only fatal step; per-repository problems
    /// never abort the batch.
    pub async fn synchronize(
        &self,
        catalog: &Catalog,
        layout: &MirrorLayout,
    ) -> std::io::Result<SyncSummary> {
        let start_time = Instant::now();
        let current = layout.ensure_current()?;

        info!(
            "Synchronizing {} repositories into {} with {} workers",
            catalog.len(),
            current.display(),
            self.max_parallel
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut futures = FuturesUnordered::new();

        for repo in &catalog.repositories {
            let semaphore = semaphore.clone();
            let current = current.as_path();

            futures.push(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return SyncAction::LaunchFailed {
                            dir: repo.directory_name().to_string(),
                            error: e.to_string(),
                        }
                    }
                };
                self.sync_one(repo, current).await
            });
        }

        let mut actions = Vec::with_capacity(catalog.len());
        while let Some(action) = futures.next().await {
            debug!("Finished: {:?}", action);
            actions.push(action);
        }

        let summary = SyncSummary::compile(actions, start_time.elapsed());
        info!(
            "Synchronized in {:.2}s: {} cloned, {} fetched, {} could not start git",
            summary.duration.as_secs_f64(),
            summary.cloned,
            summary.fetched,
            summary.launch_failures
        );

        Ok(summary)
    }

    async fn sync_one(&self, repo: &RepositoryRecord, current: &Path) -> SyncAction {
        let dir = repo.directory_name().to_string();
        let target: PathBuf = current.join(&dir);

        println!("{}", highlight(&dir, self.highlight));

        let (result, action) = if target.exists() {
            (
                self.git.fetch_prune(&target).await,
                SyncAction::Fetched { dir: dir.clone() },
            )
        } else {
            (
                self.git.clone_mirror(&repo.clone_url, current, &dir).await,
                SyncAction::Cloned { dir: dir.clone() },
            )
        };

        match result {
            Ok(()) => action,
            Err(e) => {
                warn!("Could not run git for {}: {}", dir, e);
                SyncAction::LaunchFailed {
                    dir,
                    error: e.to_string(),
                }
            }
        }
    }
}
