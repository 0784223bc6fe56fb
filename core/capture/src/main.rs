/// Snapmark - capture, summarize and organize browser tabs
///
/// Usage:
///   snapmark [--db-path <path>] serve [--addr <host:port>]
///   snapmark capture --title <title> --url <url> (--text <text> | --text-file <path>)
///   snapmark list | search <query> | delete <id> | set-intent <id> <intent> | export [-o <file>]
///
/// Model summaries are enabled with SNAPMARK_USE_LLM=true (see SNAPMARK_LLM_*).
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use snapmark_capture::server::{router, AppState};
use snapmark_capture::{ServiceConfig, SnapmarkService, SubmittedPage};
use snapmark_schemas::{Action, MessageRequest, PageContent, TabInfo};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "snapmark")]
#[command(about = "Capture browser tabs as summarized, intent-tagged snapshots")]
struct Args {
    /// Path to SQLite database file (overrides SNAPMARK_DB_PATH)
    #[arg(long, short, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service for the browser extension
    Serve {
        /// Bind address (overrides SNAPMARK_ADDR)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Capture a page from the command line
    Capture {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long, conflicts_with = "text_file")]
        text: Option<String>,
        #[arg(long)]
        text_file: Option<PathBuf>,
    },
    /// List all snapshots, most recent first
    List,
    /// Search snapshots by title, intent, url or summary
    Search { query: String },
    /// Delete a snapshot
    Delete { id: String },
    /// Replace the intent of a snapshot
    SetIntent { id: String, intent: String },
    /// Export all snapshots as markdown
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = ServiceConfig::from_env();
    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }
    info!("Database: {}", config.db_path.display());

    let service = SnapmarkService::from_config(&config)?;

    let request = match args.command {
        Command::Serve { addr } => {
            let addr = addr.unwrap_or(config.bind_addr);
            return serve(service, &addr).await;
        }
        Command::Capture {
            title,
            url,
            text,
            text_file,
        } => {
            let text = match text_file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => text.unwrap_or_default(),
            };
            MessageRequest {
                tab: Some(TabInfo {
                    id: None,
                    title: title.clone(),
                    url: url.clone(),
                }),
                content: Some(PageContent {
                    title: title.unwrap_or_default(),
                    text,
                    url: url.unwrap_or_default(),
                    word_count: None,
                }),
                ..MessageRequest::new(Action::CaptureCurrentTab)
            }
        }
        Command::List => MessageRequest::new(Action::GetSnapshots),
        Command::Search { query } => MessageRequest {
            query: Some(query),
            ..MessageRequest::new(Action::SearchSnapshots)
        },
        Command::Delete { id } => MessageRequest {
            id: Some(id),
            ..MessageRequest::new(Action::DeleteSnapshot)
        },
        Command::SetIntent { id, intent } => MessageRequest {
            id: Some(id),
            new_intent: Some(intent),
            ..MessageRequest::new(Action::UpdateSnapshotIntent)
        },
        Command::Export { output } => {
            let markdown = service.store().export_markdown().await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, markdown)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Exported markdown to {}", path.display());
                }
                None => print!("{}", markdown),
            }
            return Ok(());
        }
    };

    let pages = SubmittedPage::from_request(&request);
    let response = service.handle(request, &pages).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

async fn serve(service: SnapmarkService, addr: &str) -> Result<()> {
    info!("Snapmark service v{}", env!("CARGO_PKG_VERSION"));

    let app = router(AppState { service });

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
