use clap::{Args, Parser, Subcommand};

/// Pull sale leads from the call-center into the CRM.
#[derive(Parser, Debug)]
#[command(name = "leadsync", about = "Lead sync client for the CRM API")]
pub struct CliArgs {
    /// API base URL, tried before any derived address
    #[arg(long, env = "LEADSYNC_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Origin the API is served under; used for the :port and proxy fallbacks
    #[arg(long, env = "LEADSYNC_ORIGIN", global = true)]
    pub origin: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List importable sale leads and per-list counts
    Discover {
        /// Print the raw discovery payload as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import selected leads
    Import(ImportArgs),
    /// Show the current sync job
    Status,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Import synchronously without enrichment
    #[arg(long)]
    pub quick: bool,

    /// Import every discovered sale lead
    #[arg(long, conflicts_with = "lead")]
    pub all: bool,

    /// Lead id to import (repeatable)
    #[arg(long = "lead", value_name = "ID")]
    pub lead: Vec<String>,

    /// Return once the import is accepted instead of polling to completion
    #[arg(long)]
    pub no_wait: bool,
}
