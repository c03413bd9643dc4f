use tracing::info;

use crate::{
    error::{CleanupError, Result},
    people::{ContactGroup, ContactsApi},
    throttle::{RateLimiter, RetryingCaller},
};

/// Maps human label names to contact group resource names.
pub struct LabelResolver<A> {
    api: A,
    limiter: RateLimiter,
    retry: RetryingCaller,
}

impl<A: ContactsApi> LabelResolver<A> {
    pub fn new(api: A, limiter: RateLimiter, retry: RetryingCaller) -> Self {
        Self { api, limiter, retry }
    }

    pub async fn contact_groups(&self) -> Result<Vec<ContactGroup>> {
        self.retry
            .invoke("list contact groups", move || async move {
                self.limiter.throttle().await;
                self.api.list_contact_groups().await
            })
            .await
    }

    /// All label names, in the order the API returns them.
    pub async fn label_names(&self) -> Result<Vec<String>> {
        Ok(self
            .contact_groups()
            .await?
            .into_iter()
            .map(|group| group.name)
            .collect())
    }

    /// Resolve `name` to its `contactGroups/...` resource name (exact match).
    pub async fn resolve(&self, name: &str) -> Result<String> {
        let group = self
            .contact_groups()
            .await?
            .into_iter()
            .find(|group| group.name == name)
            .ok_or_else(|| CleanupError::LabelNotFound(name.to_string()))?;

        info!("Label {} resolved to {}", name, group.resource_name);
        Ok(group.resource_name)
    }
}
