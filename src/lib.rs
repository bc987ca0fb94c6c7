//! ghmirror - Mirror every GitHub repository of a user or organization
//!
//! ghmirror keeps bare mirror clones of all repositories belonging to one
//! owner under `{root}/{owner}/current`, retires clones whose repository
//! vanished or was archived into `{root}/{owner}/abandoned`, and searches
//! across the whole tree.
//!
//! ## Modules
//!
//! - [`github`]: authenticated, paginated GitHub REST access
//! - [`catalog`]: which repositories belong to an owner
//! - [`sync`]: parallel clone-or-fetch over a catalog
//! - [`retire`]: moving vanished repositories out of `current/`
//! - [`search`]: `grep` and `ls-files` over every mirror

pub mod catalog;
pub mod config;
pub mod credentials;
pub mod error;
pub mod git;
pub mod github;
pub mod layout;
pub mod output;
pub mod repository;
pub mod retire;
pub mod search;
pub mod sync;

pub use catalog::{Catalog, CatalogRequest};
pub use config::Config;
pub use error::{MirrorError, Result};
pub use git::{GitClient, MirrorOperations};
pub use github::GitHubClient;
pub use layout::MirrorLayout;
pub use repository::RepositoryRecord;
pub use sync::{SyncEngine, SyncSummary};
