pub mod auth;
pub mod client;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

pub use auth::{StoredToken, TokenStore};
pub use client::PeopleClient;
pub use types::{ConnectionsPage, ContactGroup, Person};

/// The three People API calls a cleanup run needs.
#[async_trait]
pub trait ContactsApi: Send + Sync {
    async fn list_connections(&self, page_token: Option<&str>, page_size: u32) -> Result<ConnectionsPage>;

    async fn delete_contact(&self, resource_name: &str) -> Result<()>;

    async fn list_contact_groups(&self) -> Result<Vec<ContactGroup>>;
}

#[async_trait]
impl<T: ContactsApi + ?Sized> ContactsApi for Arc<T> {
    async fn list_connections(&self, page_token: Option<&str>, page_size: u32) -> Result<ConnectionsPage> {
        (**self).list_connections(page_token, page_size).await
    }

    async fn delete_contact(&self, resource_name: &str) -> Result<()> {
        (**self).delete_contact(resource_name).await
    }

    async fn list_contact_groups(&self) -> Result<Vec<ContactGroup>> {
        (**self).list_contact_groups().await
    }
}
