use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "contact-cleanup")]
#[command(about = "Delete single-purpose contacts from a Google Contacts label")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a label's contacts, export the result and delete the rest
    Clean {
        /// Label to filter contacts
        #[arg(short, long)]
        label: Option<String>,

        /// Fetch, classify and export without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List all contact labels
    Labels,

    /// Show previous cleanup runs
    History {
        /// Number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}
