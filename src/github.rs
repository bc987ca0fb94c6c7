use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::GitHubConfig;
use crate::credentials::Authorization;
use crate::error::{MirrorError, Result};
use crate::repository::RepositoryRecord;

/// Authenticated GitHub REST client
///
/// Every request carries the resolved Authorization header and the configured
/// User-Agent. Nothing is retried: a transport error or any non-200 answer is
/// returned to the caller as is.
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    api_root: String,
    user_agent: String,
    authorization: Authorization,
    page_size: usize,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig, authorization: Authorization) -> Result<Self> {
        let http = Client::builder().build()?;

        Ok(Self {
            http,
            api_root: config.api_root.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            authorization,
            page_size: config.page_size.max(1),
        })
    }

    /// GET a URL and decode the JSON body
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, self.authorization.header_value())
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(MirrorError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch every page of a repository listing
    ///
    /// A full page always triggers a request for the next one; the first short
    /// (or empty) page ends the listing. Order is the API's, concatenated.
    pub async fn list(&self, url: &str) -> Result<Vec<RepositoryRecord>> {
        let separator = if url.contains('?') { '&' } else { '?' };
        let mut repositories = Vec::new();
        let mut page = 1usize;

        loop {
            let page_url = format!(
                "{}{}per_page={}&page={}",
                url, separator, self.page_size, page
            );
            let items: Vec<RepositoryRecord> =
                serde_json::from_value(self.get_json(&page_url).await?)?;

            let count = items.len();
            repositories.extend(items);

            if count < self.page_size {
                break;
            }
            page += 1;
        }

        debug!("Listed {} repositories from {}", repositories.len(), url);
        Ok(repositories)
    }

    /// Login name of the authenticated account
    pub async fn current_user_login(&self) -> Result<String> {
        let user = self.get_json(&format!("{}/user", self.api_root)).await?;

        let login = user
            .get("login")
            .and_then(Value::as_str)
            .ok_or_else(|| MirrorError::MissingField("login".to_string()))?
            .to_string();

        info!("Authenticated as GitHub user: {}", login);
        Ok(login)
    }

    pub async fn organization_repositories(&self, org: &str) -> Result<Vec<RepositoryRecord>> {
        self.list(&format!("{}/orgs/{}/repos", self.api_root, org))
            .await
    }

    pub async fn user_repositories(&self, user: &str) -> Result<Vec<RepositoryRecord>> {
        self.list(&format!("{}/users/{}/repos", self.api_root, user))
            .await
    }

    /// A single repository; 404 becomes [`MirrorError::NotFound`]
    pub async fn repository(&self, owner: &str, name: &str) -> Result<RepositoryRecord> {
        let url = format!("{}/repos/{}/{}", self.api_root, owner, name);

        match self.get_json(&url).await {
            Ok(value) => RepositoryRecord::from_value(value),
            Err(e) if e.is_not_found() => Err(MirrorError::NotFound {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}
