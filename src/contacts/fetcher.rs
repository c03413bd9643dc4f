use tracing::{debug, info};

use crate::{
    error::{CleanupError, Result},
    people::{ContactsApi, Person},
    throttle::{RateLimiter, RetryingCaller},
};

pub const DEFAULT_PAGE_SIZE: u32 = 2000;

/// Pages through `people/me/connections` and keeps members of one contact group.
pub struct ContactFetcher<A> {
    api: A,
    limiter: RateLimiter,
    retry: RetryingCaller,
    page_size: u32,
}

impl<A: ContactsApi> ContactFetcher<A> {
    pub fn new(api: A, limiter: RateLimiter, retry: RetryingCaller) -> Self {
        Self {
            api,
            limiter,
            retry,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Fetch every page and return the members of `group_resource_name` in page order.
    ///
    /// The connections endpoint cannot filter by group, so membership is
    /// checked on each record. A page that fails permanently aborts the
    /// whole fetch: a partial list must never reach classification.
    pub async fn fetch_all(&self, group_resource_name: &str) -> Result<Vec<Person>> {
        info!("Fetching contacts in {}", group_resource_name);

        let mut contacts = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0;

        loop {
            let token = page_token.as_deref();
            let page = self
                .retry
                .invoke("list connections", move || async move {
                    self.limiter.throttle().await;
                    self.api.list_connections(token, self.page_size).await
                })
                .await
                .map_err(|e| CleanupError::FetchAborted {
                    pages,
                    source: Box::new(e),
                })?;
            pages += 1;

            let page_len = page.connections.len();
            let matching: Vec<Person> = page
                .connections
                .into_iter()
                .filter(|person| person.is_member_of(group_resource_name))
                .collect();
            debug!("Page {}: {} of {} connections in group", pages, matching.len(), page_len);
            contacts.extend(matching);

            info!("Fetched page {} ({} matching contacts so far)", pages, contacts.len());

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        info!("Found {} contacts", contacts.len());
        Ok(contacts)
    }
}
