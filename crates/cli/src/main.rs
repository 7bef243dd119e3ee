mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use leadsync_cli::{EndpointResolver, PollPolicy, SourceAdapter, StatusPoller, StatusSource};
use leadsync_core::{Config, SourceLead};

use crate::cli::{CliArgs, Command, ImportArgs};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    leadsync_core::config::load_dotenv();
    let args = CliArgs::parse();
    let mut config = Config::from_env().client;
    if let Some(url) = args.api_url {
        config.api_url = Some(url);
    }
    if let Some(origin) = args.origin {
        config.origin = origin;
    }

    let resolver = EndpointResolver::from_config(&config);
    info!(candidates = ?resolver.candidates(), "endpoint candidates");
    let adapter = SourceAdapter::new(resolver);

    match args.command {
        Command::Discover { json } => discover(&adapter, json).await,
        Command::Import(import_args) => {
            import(&adapter, import_args, PollPolicy::from_config(&config)).await
        }
        Command::Status => {
            let snap = adapter.sync_status().await?;
            println!(
                "{} {}% ({}/{}) {}",
                snap.status, snap.percentage, snap.processed_leads, snap.total_leads, snap.message
            );
            for err in &snap.errors {
                println!("  lead {}: {}", err.lead_id, err.error);
            }
            Ok(())
        }
    }
}

async fn discover(adapter: &SourceAdapter, json: bool) -> Result<()> {
    let resp = adapter.discover().await.context("discovery failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&resp)?);
        return Ok(());
    }
    println!("{}", resp.message);
    for list in &resp.all_lists_summary {
        let flag = if list.active { "" } else { " (inactive)" };
        println!("  list {:>6} {:<30} {:>4}{}", list.list_id, list.list_name, list.lead_count, flag);
    }
    for lead in &resp.sale_leads {
        println!(
            "  {:<10} {:<30} {}",
            lead.id,
            lead.name.as_deref().unwrap_or("-"),
            lead.list_name.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn select(all: Vec<SourceLead>, args: &ImportArgs) -> Vec<SourceLead> {
    if args.all {
        return all;
    }
    all.into_iter()
        .filter(|l| args.lead.iter().any(|id| id == &l.id))
        .collect()
}

async fn import(adapter: &SourceAdapter, args: ImportArgs, policy: PollPolicy) -> Result<()> {
    if !args.all && args.lead.is_empty() {
        bail!("pass --all or at least one --lead <ID>");
    }
    let discovered = adapter.discover().await.context("discovery failed")?;
    let selected = select(discovered.sale_leads, &args);
    if selected.len() < args.lead.len() {
        eprintln!(
            "warning: {} of {} requested leads are not currently importable",
            args.lead.len() - selected.len(),
            args.lead.len()
        );
    }

    if args.quick {
        let resp = adapter.quick_import(&selected).await?;
        println!("{}", resp.message);
        for err in &resp.errors {
            println!("  lead {}: {}", err.lead_id, err.error);
        }
        return Ok(());
    }

    let accepted = adapter.start_full_import(&selected).await?;
    println!("{} (job {})", accepted.message, accepted.job_id);
    if args.no_wait {
        return Ok(());
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let done = StatusPoller::new(adapter, policy)
        .with_cancel(cancel_rx)
        .for_job(accepted.job_id)
        .run(|p| println!("[{:>3}%] {}", p.percentage, p.message))
        .await?;
    println!("{}", done.message);
    for err in &done.errors {
        println!("  lead {}: {}", err.lead_id, err.error);
    }
    Ok(())
}
