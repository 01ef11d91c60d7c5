use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod database;
mod draw_recorder;
mod error;
mod extract;
mod models;
mod normalizer;
mod scraper;
mod scrapers;
mod traits;

use config::{Catalog, Config};
use draw_recorder::DrawRecorder;
use error::RecorderError;

/// Fetch the latest lottery draw and store it once.
#[derive(Debug, Parser)]
#[command(name = "lottery-draws", version)]
struct Cli {
    /// Menu number of the lottery to fetch; prompts when omitted
    selection: Option<String>,

    /// Print the lottery menu and exit
    #[arg(long, conflicts_with_all = ["selection", "watch"])]
    list: bool,

    /// Check every lottery now and then on WATCH_SCHEDULE
    #[arg(long, conflicts_with = "selection")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    if cli.list {
        print_menu(&config.catalog);
        return Ok(());
    }

    info!("Starting lottery draw recorder");
    let recorder = DrawRecorder::new(&config).await?;

    if cli.watch {
        return watch(recorder, &config.watch_schedule).await;
    }

    let choice = match cli.selection {
        Some(choice) => choice,
        None => prompt_selection(recorder.catalog()).await?,
    };

    report(recorder.record_selection(&choice).await);
    Ok(())
}

fn print_menu(catalog: &Catalog) {
    println!("Available lotteries:");
    for lottery in catalog.iter() {
        println!("{}. {}", lottery.id, lottery.display_name);
    }
}

async fn prompt_selection(catalog: &Catalog) -> Result<String> {
    print_menu(catalog);

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("\nSelect lottery (1-{}): ", catalog.len()).as_bytes())
        .await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

/// Prints the outcome; every handled outcome exits normally.
fn report(result: Result<draw_recorder::RunOutcome, RecorderError>) {
    println!();
    match result {
        Ok(outcome) => println!("{}", outcome.summary()),
        Err(RecorderError::Selection(choice)) => {
            println!("Invalid selection {choice:?}. Exiting.");
        }
        Err(RecorderError::Fetch(e)) => {
            error!("Fetch failed: {}", e);
            if e.is_timeout() {
                println!("Fetch timed out: {e}");
            } else {
                println!("Fetch failed: {e}");
            }
        }
        Err(RecorderError::Extraction(e)) => {
            error!("Extraction failed: {}", e);
            println!("Not saved: {e}");
        }
        Err(RecorderError::Database(e)) => {
            error!("Database error: {}", e);
            println!("Not saved, database error: {e}");
        }
    }
}

async fn watch(recorder: DrawRecorder, schedule: &str) -> Result<()> {
    // Run once immediately
    if let Err(e) = recorder.check_all().await {
        error!("Error during initial check: {}", e);
    }

    let mut sched = JobScheduler::new().await?;

    let job_recorder = recorder.clone();
    sched
        .add(Job::new_async(schedule, move |_uuid, _l| {
            let recorder = job_recorder.clone();
            Box::pin(async move {
                if let Err(e) = recorder.check_all().await {
                    error!("Error checking for new draws: {}", e);
                }
            })
        })?)
        .await?;

    info!("Scheduler started with schedule {}", schedule);
    sched.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    sched.shutdown().await?;
    Ok(())
}
