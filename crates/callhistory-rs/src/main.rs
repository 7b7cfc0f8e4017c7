//! Command line access to call history, dial suggestions and call details.

use anyhow::{Context, bail};
use callhistory_rs::CallHistoryRuntime;
use callhistory_rs::config::CallHistoryConfig;
use callhistory_rs::core::{FileCallLog, FileContactDirectory, LogDialer};
use callhistory_rs::protocol::{CallRecord, DayFilter, Suggestion, SuggestionKind, TypeFilter};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

/// Command-line options for the call history client.
#[derive(Parser)]
#[command(name = "callhistory", version)]
struct Cli {
    /// Optional path to a callhistory.json5 config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Call log file, one JSON row per line
    #[arg(long, default_value = "calls.jsonl")]
    calls: PathBuf,
    /// Contacts file, a JSON array
    #[arg(long, default_value = "contacts.json")]
    contacts: PathBuf,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the call history grouped by day
    History {
        /// Text to look for in numbers and contact names
        #[arg(long, default_value = "")]
        search: String,
        /// all, dialed, received or missed
        #[arg(long, default_value = "all")]
        filter: TypeFilter,
        /// all or a weekday name
        #[arg(long, default_value = "all")]
        day: DayFilter,
    },
    /// Rank dial suggestions for the typed digits
    Suggest {
        #[arg(default_value = "")]
        digits: String,
    },
    /// Show every call with one number
    Details { number: String },
    /// Place a call
    Call { number: String },
    /// Search the contact directory
    Contacts {
        #[arg(default_value = "")]
        query: String,
    },
}

/// Entry point for the call history CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    callhistory_rs::init_logging();

    let cli = Cli::parse();
    let config = if let Some(path) = cli.config.as_ref() {
        info!("loading config from path: {}", path.display());
        CallHistoryConfig::load_from_path(path).context("failed to load config")?
    } else {
        let cwd = std::env::current_dir().context("cwd")?;
        let layered =
            CallHistoryConfig::load_layered(&cwd).context("failed to load layered config")?;
        debug!("layered config loaded (layers={})", layered.layers.len());
        layered.config
    };

    let runtime = CallHistoryRuntime::new(
        config,
        Arc::new(FileCallLog::new(&cli.calls)),
        Arc::new(FileContactDirectory::new(&cli.contacts)),
        Arc::new(LogDialer),
    );

    match cli.command {
        Command::History {
            search,
            filter,
            day,
        } => show_history(&runtime, &search, filter, day, cli.json).await,
        Command::Suggest { digits } => show_suggestions(&runtime, &digits, cli.json).await,
        Command::Details { number } => show_details(&runtime, &number, cli.json).await,
        Command::Call { number } => {
            runtime.place_call(&number);
            println!("Calling {number}");
            Ok(())
        }
        Command::Contacts { query } => {
            let contacts = runtime
                .search_contacts(&query)
                .await
                .context("failed to read contacts")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&contacts)?);
            } else {
                for contact in contacts {
                    println!("{:<24} {}", contact.display_name, contact.phone_number);
                }
            }
            Ok(())
        }
    }
}

async fn show_history(
    runtime: &CallHistoryRuntime,
    search: &str,
    filter: TypeFilter,
    day: DayFilter,
    json: bool,
) -> anyhow::Result<()> {
    let view = runtime.history_view();
    view.set_search_text(search);
    view.set_day_filter(day);
    view.set_type_filter(filter);
    let loaded = view.load_all().await.context("failed to load call history")?;
    debug!("history loaded (records={loaded})");

    if json {
        println!("{}", serde_json::to_string_pretty(&view.visible_records().await)?);
        return Ok(());
    }
    let names = view.contact_names();
    for section in view.sections(runtime.clock().now_ms()).await {
        println!("{}", section.title);
        for record in &section.records {
            let name = names.get(&record.number).cloned().flatten();
            println!("  {}", history_line(record, name.as_deref()));
        }
    }
    Ok(())
}

fn history_line(record: &CallRecord, name: Option<&str>) -> String {
    format!(
        "{}  {:<8}  {:<16}  {}",
        record.formatted_time,
        record.call_type.as_str(),
        record.number,
        name.unwrap_or("")
    )
}

async fn show_suggestions(
    runtime: &CallHistoryRuntime,
    digits: &str,
    json: bool,
) -> anyhow::Result<()> {
    let snapshot = tokio::time::timeout(SNAPSHOT_TIMEOUT, runtime.suggestions_for(digits))
        .await
        .context("timed out waiting for suggestions")?
        .context("failed to compute suggestions")?;

    if let Some(error) = &snapshot.history_error {
        bail!("failed to load call history: {error}");
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.suggestions)?);
    } else {
        for suggestion in &snapshot.suggestions {
            println!("{}", suggestion_line(suggestion));
        }
    }
    Ok(())
}

fn suggestion_line(suggestion: &Suggestion) -> String {
    let origin = match suggestion.kind {
        SuggestionKind::Call(call_type) => call_type.as_str(),
        SuggestionKind::Contact => "contact",
    };
    format!(
        "{:<16}  {:<8}  {}",
        suggestion.number,
        origin,
        suggestion.display_name.as_deref().unwrap_or("")
    )
}

async fn show_details(
    runtime: &CallHistoryRuntime,
    number: &str,
    json: bool,
) -> anyhow::Result<()> {
    let details = runtime
        .call_details(number)
        .await
        .context("failed to load call details")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }
    println!(
        "{} {}",
        details.number,
        details.display_name.as_deref().unwrap_or("")
    );
    for record in &details.calls {
        println!(
            "  {}  {:<8}  {}s",
            record.formatted_time,
            record.call_type.as_str(),
            record.duration_sec
        );
    }
    Ok(())
}
