//! Repository catalog resolution
//!
//! A catalog is built fresh on every invocation: either every repository of
//! an owner (organization first, user account on 404) or one named repository.

use tracing::{debug, info};

use crate::error::Result;
use crate::github::GitHubClient;
use crate::repository::RepositoryRecord;

/// What to resolve
#[derive(Debug, Clone, Default)]
pub struct CatalogRequest {
    /// User or organization; the authenticated account when `None`
    pub owner: Option<String>,
    /// Resolve exactly this repository instead of listing
    pub repository: Option<String>,
    /// Keep archived repositories in a listing
    pub include_archived: bool,
}

/// Ordered repository list for one owner
#[derive(Debug, Clone)]
pub struct Catalog {
    pub owner: String,
    pub repositories: Vec<RepositoryRecord>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Local directory names, in catalog order
    pub fn directory_names(&self) -> Vec<&str> {
        self.repositories
            .iter()
            .map(RepositoryRecord::directory_name)
            .collect()
    }
}

/// Owner name to use, asking the API for the login when none was given
pub async fn resolve_owner(client: &GitHubClient, owner: Option<&str>) -> Result<String> {
    match owner {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => client.current_user_login().await,
    }
}

/// Build the catalog for a request
pub async fn resolve(client: &GitHubClient, request: &CatalogRequest) -> Result<Catalog> {
    let owner = resolve_owner(client, request.owner.as_deref()).await?;

    if let Some(name) = request.repository.as_deref().filter(|n| !n.is_empty()) {
        // An explicitly named repository is included even when archived
        let record = client.repository(&owner, name).await?;
        return Ok(Catalog {
            owner,
            repositories: vec![record],
        });
    }

    let all = list_for_owner(client, &owner).await?;
    let total = all.len();
    let repositories = filter_archived(all, request.include_archived);

    info!(
        "Resolved {} repositories for {} ({} before archive filter)",
        repositories.len(),
        owner,
        total
    );

    Ok(Catalog {
        owner,
        repositories,
    })
}

/// List as an organization; on 404 only, list as a user account
pub async fn list_for_owner(client: &GitHubClient, owner: &str) -> Result<Vec<RepositoryRecord>> {
    match client.organization_repositories(owner).await {
        Err(e) if e.is_not_found() => {
            debug!("{} is not an organization, listing as user", owner);
            client.user_repositories(owner).await
        }
        other => other,
    }
}

/// Drop archived repositories unless asked to keep them, preserving order
pub fn filter_archived(
    repositories: Vec<RepositoryRecord>,
    include_archived: bool,
) -> Vec<RepositoryRecord> {
    if include_archived {
        return repositories;
    }

    repositories
        .into_iter()
        .filter(|repo| !repo.archived)
        .collect()
}
