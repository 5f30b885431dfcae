use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tower_lsp::{LspService, Server};
use tracing::info;

use robot_data_editor::completion::CompletionEngine;
use robot_data_editor::config::ServerConfig;
use robot_data_editor::data::{ClassificationResult, DocumentClassifier, LineClassifier, TableKind};
use robot_data_editor::logging::init_logger;
use robot_data_editor::lsp::RobotBackend;
use robot_data_editor::session::{FileStore, FsFileStore, Navigator};

#[derive(Parser)]
#[command(name = "robot-data-editor")]
#[command(about = "Editing support for Robot Framework test data")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Disable ANSI colors on stderr
    #[arg(long, global = true)]
    no_color: bool,

    /// Log filter for stderr (defaults to RUST_LOG, then "info")
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the language server on stdin/stdout (default)
    Serve {
        /// Autosave period in milliseconds, 0 disables autosave
        #[arg(long, value_name = "MS")]
        autosave_ms: Option<u64>,

        /// Do not write a session log file
        #[arg(long)]
        no_file_log: bool,
    },
    /// Print one JSON line per line of FILE with its table and highlight span
    Classify { file: PathBuf },
    /// Print the setting names completing PREFIX
    Complete { prefix: String },
    /// Print the directories and test data files below ROOT as JSON lines
    List { root: PathBuf },
}

#[derive(Serialize)]
struct ClassifiedLine {
    line: usize,
    table: TableKind,
    #[serde(flatten)]
    result: ClassificationResult,
}

async fn serve(config: ServerConfig) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| RobotBackend::new(client, config));
    info!("Serving on stdio");
    Server::new(stdin, stdout, socket).serve(service).await;
}

fn classify(file: PathBuf) -> Result<()> {
    let text = FsFileStore.read(&file)?;
    let classifier = DocumentClassifier::default();
    let mut lines = LineClassifier::new(&classifier);
    let mut out = io::stdout().lock();
    for (line, content) in text.lines().enumerate() {
        let result = lines.classify_line(content);
        let record = ClassifiedLine { line, table: lines.current_table(), result };
        writeln!(out, "{}", serde_json::to_string(&record)?)?;
    }
    Ok(())
}

fn complete(prefix: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    for setting in CompletionEngine::new().entries(prefix) {
        writeln!(out, "{}\t{}", setting.name, setting.description)?;
    }
    Ok(())
}

fn list(root: PathBuf) -> Result<()> {
    let extensions = ServerConfig::default().extensions;
    let mut out = io::stdout().lock();
    for entry in Navigator::new(root, &extensions).entries() {
        writeln!(out, "{}", serde_json::to_string(&entry)?)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve { autosave_ms: None, no_file_log: false });

    // One-shot commands keep stderr quiet and never write a session log.
    let (log_level, file_logging) = match &command {
        Command::Serve { no_file_log, .. } => (cli.log_level.as_deref(), !no_file_log),
        _ => (Some(cli.log_level.as_deref().unwrap_or("warn")), false),
    };
    let _guard = init_logger(cli.no_color, log_level, file_logging).context("failed to initialize logging")?;

    match command {
        Command::Serve { autosave_ms, .. } => {
            let mut config = ServerConfig::default();
            if let Some(ms) = autosave_ms {
                config.autosave_interval_ms = ms;
            }
            serve(config.with_env()).await;
            Ok(())
        }
        Command::Classify { file } => classify(file),
        Command::Complete { prefix } => complete(&prefix),
        Command::List { root } => list(root),
    }
}
