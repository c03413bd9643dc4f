use clap::Parser;
use colored::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use contact_cleanup::{
    cleanup::{CleanupPipeline, CleanupPlan},
    cli::{Cli, Commands},
    contacts::LabelResolver,
    error::{CleanupError, Result},
    people::{PeopleClient, TokenStore},
    storage::Database,
    throttle::{RateLimiter, RetryPolicy, RetryingCaller},
    utils, Config,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("contact_cleanup=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Clean { label, dry_run, yes } => clean(&cli.config, label, dry_run, yes).await,

        Commands::Labels => list_labels(&cli.config).await,

        Commands::History { limit, format } => show_history(&cli.config, limit, &format),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

async fn connect(config: &Config) -> Result<PeopleClient> {
    let access_token = TokenStore::new(&config.auth.token_path).access_token().await?;
    PeopleClient::with_timeout(&config.people.base_url, access_token, config.request_timeout())
}

async fn clean(config_path: &str, label: Option<String>, dry_run: bool, yes: bool) -> Result<()> {
    // Checked before anything else so a missing label never reaches the API.
    let label = label
        .filter(|l| !l.trim().is_empty())
        .ok_or(CleanupError::MissingLabel)?;

    let config = Config::load(config_path)?;
    let client = connect(&config).await?;
    let pipeline = CleanupPipeline::new(client, &config, dry_run)?;

    info!("Rule order: {}", pipeline.rules().names().join(" > "));
    println!("{}", format!("Cleaning up contacts labelled {}...", label).cyan());
    let plan = pipeline.plan(&label).await?;
    print_plan(&plan);

    if plan.partition.is_empty() {
        println!("{}", format!("No contacts found under label {}", label).yellow());
        return Ok(());
    }

    if plan.partition.to_delete.is_empty() {
        println!("{}", "Nothing to delete".green());
        return Ok(());
    }

    if dry_run {
        println!("\n{}", "DRY RUN: No contacts will be deleted".yellow());
    } else if !yes
        && !utils::confirm_action(&format!("Delete {} contacts?", plan.partition.to_delete.len()))?
    {
        println!("Cancelled");
        return Ok(());
    }

    let mut db = Database::new(&config.database.path)?;
    let run_id = db.start_run(&plan, dry_run)?;

    let summary = pipeline.apply(&plan).await;
    summary.print_summary();

    db.finish_run(run_id, &summary)?;
    info!("Run {} saved to database", run_id);

    if !summary.is_complete() {
        return Err(CleanupError::Auth(format!(
            "credentials rejected, {} contacts were not attempted; refresh {} and run again",
            summary.unprocessed.len(),
            config.auth.token_path
        )));
    }

    println!("{}", "done".green());
    Ok(())
}

fn print_plan(plan: &CleanupPlan) {
    println!("\n{}", "=== Classification ===".cyan().bold());
    println!("Label:       {} ({})", plan.label, plan.group_resource_name);
    println!("Fetched:     {}", plan.fetched);
    println!("Kept:        {}", plan.partition.kept.len().to_string().green());
    println!("To delete:   {}", plan.partition.to_delete.len().to_string().yellow());
    println!("\nKept contacts saved to     {}", plan.exported.kept.display());
    println!("Contacts to delete saved to {}", plan.exported.to_delete.display());
}

async fn list_labels(config_path: &str) -> Result<()> {
    let config = Config::load(config_path)?;
    let client = connect(&config).await?;
    let resolver = LabelResolver::new(
        client,
        RateLimiter::per_minute(config.limits.list_calls_per_minute),
        RetryingCaller::new(RetryPolicy {
            initial_backoff: config.initial_backoff(),
            max_retries: config.limits.max_retries,
        }),
    );

    let labels = resolver.label_names().await?;
    println!("{}", "Contact labels:".cyan());
    for label in &labels {
        println!("  {}", label);
    }
    Ok(())
}

fn show_history(config_path: &str, limit: usize, format: &str) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::new(&config.database.path)?;
    let runs = db.recent_runs(limit)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    let stats = db.get_stats()?;
    println!("{}", "=== Contact Cleanup History ===".cyan().bold());
    println!("Runs:       {} ({} dry runs)", stats.total_runs, stats.dry_runs);
    println!("Kept:       {}", stats.contacts_kept.to_string().green());
    println!("Deleted:    {}", stats.contacts_deleted.to_string().yellow());
    println!("Failed:     {}", stats.deletions_failed.to_string().red());

    if runs.is_empty() {
        return Ok(());
    }

    println!();
    utils::print_table_border(88);
    utils::print_table_row(
        &["Started", "Label", "Fetched", "Kept", "Deleted", "Failed", "Mode"],
        &[24, 16, 8, 8, 8, 8, 6],
    );
    utils::print_table_border(88);
    for run in runs {
        utils::print_table_row(
            &[
                &utils::format_timestamp(&run.started_at),
                &run.label,
                &run.fetched.to_string(),
                &run.kept.to_string(),
                &run.deleted.to_string(),
                &run.failed.to_string(),
                if run.dry_run { "dry" } else { "live" },
            ],
            &[24, 16, 8, 8, 8, 8, 6],
        );
    }
    utils::print_table_border(88);

    Ok(())
}
