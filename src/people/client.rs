use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{CleanupError, Result},
    people::{
        types::{ConnectionsPage, ContactGroup, ContactGroupsPage},
        ContactsApi,
    },
};

const PERSON_FIELDS: &str = "names,phoneNumbers,memberships";
const GROUPS_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin People API v1 client authenticated with a bearer token.
#[derive(Clone)]
pub struct PeopleClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl PeopleClient {
    pub fn new(base_url: &str, access_token: String) -> Result<Self> {
        Self::with_timeout(base_url, access_token, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Every request, body included, must finish within `timeout`.
    pub fn with_timeout(base_url: &str, access_token: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    /// Turn a non-2xx response into `CleanupError::Api` so retry logic can classify it.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(CleanupError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ContactsApi for PeopleClient {
    async fn list_connections(&self, page_token: Option<&str>, page_size: u32) -> Result<ConnectionsPage> {
        let mut query = vec![
            ("pageSize", page_size.to_string()),
            ("personFields", PERSON_FIELDS.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        debug!("GET people/me/connections (page token: {:?})", page_token);
        let response = self
            .http
            .get(self.url("people/me/connections"))
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_contact(&self, resource_name: &str) -> Result<()> {
        debug!("DELETE {}", resource_name);
        let response = self
            .http
            .delete(self.url(&format!("{}:deleteContact", resource_name)))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn list_contact_groups(&self) -> Result<Vec<ContactGroup>> {
        let mut groups = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", GROUPS_PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .http
                .get(self.url("contactGroups"))
                .bearer_auth(&self.access_token)
                .query(&query)
                .send()
                .await?;
            let page: ContactGroupsPage = Self::check(response).await?.json().await?;

            groups.extend(page.contact_groups);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(groups)
    }
}
