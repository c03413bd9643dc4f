use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::{
    error::Result,
    people::{ContactsApi, Person},
    throttle::{RateLimiter, RetryingCaller},
};

/// Deletes contacts one at a time, each call rate limited and retried.
pub struct ContactDeleter<A> {
    api: A,
    limiter: RateLimiter,
    retry: RetryingCaller,
    dry_run: bool,
}

impl<A: ContactsApi> ContactDeleter<A> {
    pub fn new(api: A, limiter: RateLimiter, retry: RetryingCaller, dry_run: bool) -> Self {
        Self {
            api,
            limiter,
            retry,
            dry_run,
        }
    }

    /// Delete a single contact through the limiter and retry policy.
    pub async fn delete_contact(&self, resource_name: &str) -> Result<()> {
        if self.dry_run {
            info!("DRY RUN: Would delete {}", resource_name);
            return Ok(());
        }

        self.retry
            .invoke("delete contact", move || async move {
                self.limiter.throttle().await;
                self.api.delete_contact(resource_name).await
            })
            .await
    }

    /// Delete every contact in input order. A failure is recorded and the
    /// batch moves on to the next contact, unless the credentials were
    /// rejected: then the batch stops and the rest are left unprocessed.
    pub async fn delete_all(&self, contacts: &[Person]) -> DeletionSummary {
        let total = contacts.len();
        let mut summary = DeletionSummary {
            total,
            dry_run: self.dry_run,
            ..Default::default()
        };

        if contacts.is_empty() {
            info!("No contacts to delete");
            return summary;
        }

        info!("Deleting {} contacts...", total);
        let progress = ProgressBar::new(total as u64);
        progress.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        for (index, person) in contacts.iter().enumerate() {
            info!("Deleting {} of {}: {}", index + 1, total, person.resource_name);
            progress.set_message(person.resource_name.clone());

            match self.delete_contact(&person.resource_name).await {
                Ok(()) => {
                    summary.successful += 1;
                    summary.results.push((person.resource_name.clone(), Ok(())));
                }
                Err(e) if e.is_auth_failure() => {
                    error!("Credentials rejected while deleting {}: {}", person.resource_name, e);
                    summary.failed += 1;
                    summary.results.push((person.resource_name.clone(), Err(e)));
                    summary.unprocessed = contacts[index + 1..]
                        .iter()
                        .map(|p| p.resource_name.clone())
                        .collect();
                    warn!("Stopping batch, {} contacts left unprocessed", summary.unprocessed.len());
                    break;
                }
                Err(e) => {
                    warn!("Failed to delete {}: {}", person.resource_name, e);
                    summary.failed += 1;
                    summary.results.push((person.resource_name.clone(), Err(e)));
                }
            }
            progress.inc(1);
        }

        progress.finish_and_clear();
        info!(
            "Deletion completed: {} successful, {} failed",
            summary.successful, summary.failed
        );
        summary
    }
}

/// Per-contact outcomes of a delete batch.
#[derive(Debug, Default)]
pub struct DeletionSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub results: Vec<(String, Result<()>)>,
    /// Contacts never attempted because the batch stopped early.
    pub unprocessed: Vec<String>,
}

impl DeletionSummary {
    /// Print a formatted summary to console
    pub fn print_summary(&self) {
        println!("\n=== Deletion Summary ===");
        if self.dry_run {
            println!("DRY RUN: no contacts were deleted");
        }
        println!("Total Contacts:  {}", self.total);
        println!("Deleted:         {} ✓", self.successful);
        println!("Failed:          {} ✗", self.failed);
        for (resource_name, result) in &self.results {
            if let Err(e) = result {
                println!("  {}: {}", resource_name, e);
            }
        }
        if !self.unprocessed.is_empty() {
            println!("Not Attempted:   {}", self.unprocessed.len());
            for resource_name in &self.unprocessed {
                println!("  {}", resource_name);
            }
        }
        println!("========================");
    }

    pub fn is_complete(&self) -> bool {
        self.unprocessed.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|(_, result)| result.is_err())
            .map(|(name, _)| name.as_str())
    }
}
