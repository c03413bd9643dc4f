use std::path::PathBuf;
use tracing::info;

use crate::{
    cleanup::{
        deleter::{ContactDeleter, DeletionSummary},
        report::{self, ExportPaths, Partition},
        rules::RuleChain,
    },
    config::Config,
    contacts::{ContactFetcher, LabelResolver},
    error::{CleanupError, Result},
    people::ContactsApi,
    throttle::{RateLimiter, RetryPolicy, RetryingCaller},
};

/// Everything decided before the first delete call.
#[derive(Debug)]
pub struct CleanupPlan {
    pub label: String,
    pub group_resource_name: String,
    pub fetched: usize,
    pub partition: Partition,
    pub exported: ExportPaths,
}

/// Resolve → fetch → classify → export, then delete. Every remote call type
/// has its own rate limiter.
pub struct CleanupPipeline<A> {
    resolver: LabelResolver<A>,
    fetcher: ContactFetcher<A>,
    deleter: ContactDeleter<A>,
    rules: RuleChain,
    keep_path: PathBuf,
    delete_path: PathBuf,
}

impl<A: ContactsApi + Clone> CleanupPipeline<A> {
    pub fn new(api: A, config: &Config, dry_run: bool) -> Result<Self> {
        config.validate()?;
        let retry = RetryingCaller::new(RetryPolicy {
            initial_backoff: config.initial_backoff(),
            max_retries: config.limits.max_retries,
        });

        Ok(Self {
            resolver: LabelResolver::new(
                api.clone(),
                RateLimiter::per_minute(config.limits.list_calls_per_minute),
                retry.clone(),
            ),
            fetcher: ContactFetcher::new(
                api.clone(),
                RateLimiter::per_minute(config.limits.list_calls_per_minute),
                retry.clone(),
            )
            .with_page_size(config.people.page_size),
            deleter: ContactDeleter::new(
                api,
                RateLimiter::per_minute(config.limits.delete_calls_per_minute),
                retry,
                dry_run,
            ),
            rules: RuleChain::from_names(config.rules.order.as_slice())?,
            keep_path: config.keep_path(),
            delete_path: config.delete_path(),
        })
    }
}

impl<A: ContactsApi> CleanupPipeline<A> {
    pub fn rules(&self) -> &RuleChain {
        &self.rules
    }

    /// Everything up to, but not including, deletion. Any fetch error is
    /// returned here, so a plan always covers the complete group.
    pub async fn plan(&self, label: &str) -> Result<CleanupPlan> {
        if label.trim().is_empty() {
            return Err(CleanupError::MissingLabel);
        }

        let group_resource_name = self.resolver.resolve(label).await?;
        let contacts = self.fetcher.fetch_all(&group_resource_name).await?;
        let fetched = contacts.len();

        let partition = Partition::classify(&self.rules, contacts);
        let exported = report::export(&partition, &self.keep_path, &self.delete_path)?;

        Ok(CleanupPlan {
            label: label.to_string(),
            group_resource_name,
            fetched,
            partition,
            exported,
        })
    }

    pub async fn apply(&self, plan: &CleanupPlan) -> DeletionSummary {
        info!(
            "Deleting {} contacts from label {}",
            plan.partition.to_delete.len(),
            plan.label
        );
        self.deleter.delete_all(&plan.partition.to_delete).await
    }
}
