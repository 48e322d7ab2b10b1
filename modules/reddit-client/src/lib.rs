pub mod error;
pub mod profile;
pub mod types;

pub use error::{RedditError, Result};
pub use profile::username_from_profile;
pub use types::{permalink_url, Comment, Submission, Thing};

use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use types::{AccessToken, Listing};

const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE_URL: &str = "https://oauth.reddit.com";

/// Largest page Reddit serves for listings, also the `/api/info` id cap.
const PAGE_SIZE: u32 = 100;

pub struct RedditClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    user_agent: String,
    auth_url: String,
    base_url: String,
    token: OnceCell<String>,
}

impl RedditClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            user_agent: user_agent.into(),
            auth_url: AUTH_URL.to_string(),
            base_url: API_BASE_URL.to_string(),
            token: OnceCell::new(),
        }
    }

    /// Point the client at a different host (token endpoint is `{url}/api/v1/access_token`).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        self.auth_url = format!("{url}/api/v1/access_token");
        self.base_url = url;
        self
    }

    /// Application-only OAuth token, fetched once per client.
    async fn access_token(&self) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| async {
                let resp = self
                    .client
                    .post(&self.auth_url)
                    .basic_auth(&self.client_id, Some(&self.client_secret))
                    .header(reqwest::header::USER_AGENT, &self.user_agent)
                    .form(&[("grant_type", "client_credentials")])
                    .send()
                    .await?;

                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(RedditError::Auth(format!("status {}: {}", status.as_u16(), body)));
                }

                let grant: AccessToken = resp.json().await?;
                tracing::info!(expires_in = ?grant.expires_in, "Reddit API connection established");
                Ok::<_, RedditError>(grant.access_token)
            })
            .await?;
        Ok(token.as_str())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RedditError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    /// Walk a user listing newest-first, following `after` until `limit` items
    /// are collected or the listing runs out. Returns raw `data` objects.
    async fn listing(&self, path: &str, limit: u32) -> Result<Vec<serde_json::Value>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        while (items.len() as u32) < limit {
            let page_size = (limit - items.len() as u32).min(PAGE_SIZE);
            let mut query = vec![
                ("sort", "new".to_string()),
                ("limit", page_size.to_string()),
                ("raw_json", "1".to_string()),
            ];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let page: Listing = self.get_json(path, &query).await?;
            let fetched = page.data.children.len();
            items.extend(page.data.children.into_iter().map(|thing| thing.data));
            tracing::debug!(path, fetched, total = items.len(), "Fetched listing page");

            match page.data.after {
                Some(cursor) if fetched > 0 => after = Some(cursor),
                _ => break,
            }
        }

        items.truncate(limit as usize);
        Ok(items)
    }

    /// Most recent submissions by `username`, newest first.
    pub async fn user_submissions(&self, username: &str, limit: u32) -> Result<Vec<serde_json::Value>> {
        tracing::info!(username, limit, "Scraping user posts");
        let items = self.listing(&format!("/user/{username}/submitted"), limit).await?;
        tracing::info!(username, count = items.len(), "Fetched user posts");
        Ok(items)
    }

    /// Most recent comments by `username`, newest first.
    pub async fn user_comments(&self, username: &str, limit: u32) -> Result<Vec<serde_json::Value>> {
        tracing::info!(username, limit, "Scraping user comments");
        let items = self.listing(&format!("/user/{username}/comments"), limit).await?;
        tracing::info!(username, count = items.len(), "Fetched user comments");
        Ok(items)
    }

    /// Look up things by fullname (`t1_…`, `t3_…`) in batches of 100.
    pub async fn things_by_fullname(&self, fullnames: &[String]) -> Result<Vec<Thing>> {
        let mut things = Vec::with_capacity(fullnames.len());
        for batch in fullnames.chunks(PAGE_SIZE as usize) {
            let query = [("id", batch.join(",")), ("raw_json", "1".to_string())];
            let page: Listing = self.get_json("/api/info", &query).await?;
            things.extend(page.data.children);
        }
        tracing::debug!(requested = fullnames.len(), found = things.len(), "Resolved things by fullname");
        Ok(things)
    }
}
