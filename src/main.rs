//! Wili Dash CLI
//!
//! Terminal front end for the study-session telemetry dashboard.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wili_dash::{
    activity::create_shared_log,
    client::DashClient,
    config::Config,
    core::{AlertPolicy, AlertState, SessionId, SessionSnapshot},
    export,
    polling::{DashboardView, PollOutcome, PollingEngine},
    VERSION,
};

#[derive(Parser)]
#[command(name = "wili-dash")]
#[command(version = VERSION)]
#[command(about = "Live study-session telemetry dashboard", long_about = None)]
struct Cli {
    /// Telemetry service URL (overrides the configured one)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll a session and print its metrics as they change
    Watch {
        /// Session to view: `live` or a session timestamp
        #[arg(long, default_value = "live")]
        session: SessionId,

        /// Export the last view received to the export path on exit
        #[arg(long)]
        export_on_exit: bool,
    },

    /// List dates with recorded sessions, or the sessions of one date
    Sessions {
        /// Calendar date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Export a session snapshot as JSON
    Export {
        /// Session to export: `live` or a session timestamp
        #[arg(long, default_value = "live")]
        session: SessionId,

        /// Output directory (defaults to the configured export path)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Start a capture session on the monitor
    Start,

    /// Stop the running capture session
    Stop,

    /// Trigger a single capture and print its analysis
    Capture,

    /// Show service health and the live session
    Status,

    /// Show configuration
    Config {
        /// Write the effective configuration (including --base-url) to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config, using defaults: {}", e);
        Config::default()
    });
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command {
        Commands::Watch {
            session,
            export_on_exit,
        } => cmd_watch(&config, session, export_on_exit).await,
        Commands::Sessions { date } => cmd_sessions(&config, date).await,
        Commands::Export { session, output } => cmd_export(&config, session, output).await,
        Commands::Start => cmd_toggle(&config, true).await,
        Commands::Stop => cmd_toggle(&config, false).await,
        Commands::Capture => cmd_capture(&config).await,
        Commands::Status => cmd_status(&config).await,
        Commands::Config { save } => cmd_config(&config, save),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wili_dash=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(config: &Config) -> Result<DashClient> {
    DashClient::new(config.api_config()).context("Failed to create telemetry client")
}

async fn cmd_watch(config: &Config, session: SessionId, export_on_exit: bool) -> Result<()> {
    println!("Wili Dash v{VERSION}");
    println!("  Service: {}", config.base_url);
    println!("  Session: {session}");
    println!("  Poll interval: {}s", config.poll_interval.as_secs());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let client = build_client(config)?;
    let activity = create_shared_log();
    let mut engine = PollingEngine::new(
        Arc::new(client),
        config.poll_interval,
        AlertPolicy::new(config.low_focus_threshold),
    )
    .with_activity(Arc::clone(&activity));

    let shutdown = CancellationToken::new();
    ctrlc_handler(shutdown.clone())?;

    engine.select(session);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            outcome = engine.next_update() => match outcome {
                Some(PollOutcome::Updated(view)) => print_view(&view),
                Some(PollOutcome::Failed(message)) => {
                    eprintln!("[{}] Poll failed: {message}", Local::now().format("%H:%M:%S"));
                }
                Some(PollOutcome::Loading) | Some(PollOutcome::Discarded) => {}
                None => break,
            },
        }
    }

    engine.stop();

    if export_on_exit {
        match engine.view() {
            Some(view) => {
                let artifact = export::export_view(&view, Utc::now())?;
                let path = artifact.write_to(&config.export_path)?;
                activity.record_export_written();
                println!();
                println!("Exported {} to {:?}", view.session, path);
            }
            None => println!("Nothing to export: no snapshot received."),
        }
    }

    println!();
    println!("{}", activity.summary());
    Ok(())
}

async fn cmd_sessions(config: &Config, date: Option<NaiveDate>) -> Result<()> {
    let timezone = config.timezone()?;
    let client = build_client(config)?;
    let catalog = client.load_catalog(timezone).await;

    if catalog.is_empty() {
        println!("No recorded sessions found.");
        return Ok(());
    }

    match date {
        Some(date) => {
            if !catalog.is_session_date(date) {
                println!("No sessions on {date}.");
                return Ok(());
            }
            println!("Sessions on {date} ({timezone}):");
            for id in catalog.times_for(date) {
                println!("  {id}");
            }
        }
        None => {
            println!("Session dates ({timezone}):");
            for date in catalog.dates() {
                println!("  {date}  ({} sessions)", catalog.times_for(date).len());
            }
        }
    }
    Ok(())
}

async fn cmd_export(config: &Config, session: SessionId, output: Option<PathBuf>) -> Result<()> {
    let client = build_client(config)?;
    let snapshot = client
        .fetch_snapshot(&session)
        .await
        .with_context(|| format!("Could not fetch session {session}"))?;

    let artifact = export::export(&session, &snapshot, &snapshot.focus_history, Utc::now())?;
    let dir = output.unwrap_or_else(|| config.export_path.clone());
    let path = artifact.write_to(&dir)?;

    println!(
        "Exported {} samples to {:?}",
        snapshot.focus_history.len(),
        path
    );
    Ok(())
}

async fn cmd_toggle(config: &Config, start: bool) -> Result<()> {
    let client = build_client(config)?;
    if start {
        client.start_session().await.context("Could not start session")?;
        println!("Session started.");
    } else {
        client.stop_session().await.context("Could not stop session")?;
        println!("Session stopped.");
    }

    // Re-poll so the new state is visible immediately.
    match client.fetch_snapshot(&SessionId::Live).await {
        Ok(snapshot) => print_snapshot_header(&client, &snapshot),
        Err(e) => eprintln!("Warning: could not refresh live session: {e}"),
    }
    Ok(())
}

async fn cmd_capture(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    let analysis = client.capture_once().await.context("Capture failed")?;

    println!("Capture analysis:");
    println!("  Focused: {}", analysis.is_focused);
    println!("  Focus level: {:.0}%", analysis.focus_level * 100.0);
    println!("  Away: {}", analysis.is_away);
    if !analysis.text_summary.is_empty() {
        println!("  Summary: {}", analysis.text_summary);
    }
    Ok(())
}

async fn cmd_status(config: &Config) -> Result<()> {
    let client = build_client(config)?;

    println!("Wili Dash Status");
    println!("================");
    println!();
    println!("Service: {}", config.base_url);

    let healthy = client.health().await.unwrap_or(false);
    println!("Health: {}", if healthy { "OK ✓" } else { "Unreachable ✗" });
    if !healthy {
        return Ok(());
    }
    println!();

    let snapshot = client
        .fetch_snapshot(&SessionId::Live)
        .await
        .context("Could not fetch live session")?;
    print_snapshot_header(&client, &snapshot);

    let view = DashboardView::build(
        SessionId::Live,
        snapshot,
        AlertPolicy::new(config.low_focus_threshold),
    );
    print_view(&view);
    Ok(())
}

fn cmd_config(config: &Config, save: bool) -> Result<()> {
    if save {
        let path = config.save().context("Could not save configuration")?;
        println!("Saved configuration to {path:?}");
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn print_snapshot_header(client: &DashClient, snapshot: &SessionSnapshot) {
    println!("Live session: {}", if snapshot.session_active { "active" } else { "idle" });
    if let Some(started) = snapshot.session_started {
        println!("  Started: {}", started.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"));
        println!("  Duration: {}s", snapshot.duration_seconds);
    }
    println!("  Samples: {}", snapshot.samples_count);
    if let Some(summary) = snapshot.summary_text() {
        println!("  Latest analysis: {summary}");
    }
    if let Some(url) = client.image_url(snapshot) {
        println!("  Latest image: {url}");
    }
}

fn print_view(view: &DashboardView) {
    let metrics = &view.metrics;
    let alert = match view.alert {
        AlertState::Alert => " | LOW FOCUS",
        AlertState::Normal => "",
    };

    println!(
        "[{}] {} | {} samples | focused {}% / unfocused {}% | {}{}",
        view.received_at.with_timezone(&Local).format("%H:%M:%S"),
        view.session,
        metrics.total_samples,
        metrics.focus.focused_percent,
        metrics.focus.unfocused_percent,
        metrics
            .distribution
            .buckets()
            .iter()
            .map(|(label, count)| format!("{label} {count}"))
            .collect::<Vec<_>>()
            .join(", "),
        alert
    );

    let insights = &metrics.insights;
    for (label, text) in [
        ("noise", &insights.decibel),
        ("time", &insights.time_distribution),
        ("focus", &insights.focus),
        ("trend", &insights.trend),
    ] {
        if !text.is_empty() {
            println!("    {label:<6} {text}");
        }
    }
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(shutdown: CancellationToken) -> Result<()> {
    ctrlc::set_handler(move || {
        shutdown.cancel();
    })
    .context("Error setting Ctrl+C handler")
}
