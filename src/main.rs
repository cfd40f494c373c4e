//! `tokenlint` — run a linter session over a document snapshot.
//!
//! Prints the `api-check` broadcast, then reads one JSON request per stdin
//! line and writes one JSON response per stdout line. Logs go to stderr.

use std::io;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use tokenlint::{Error, LintConfig, MemoryHost, Session, UiResponse};

#[derive(Parser, Debug)]
#[command(name = "tokenlint", version, about = "Design-token adoption linter")]
struct Cli {
    /// Document snapshot to lint (JSON).
    #[arg(long)]
    document: PathBuf,

    /// Linter settings (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the document back here when stdin closes.
    #[arg(long)]
    save: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> tokenlint::Result<LintConfig> {
    match path {
        None => Ok(LintConfig::default()),
        Some(path) if !path.exists() => Err(Error::Config(format!("{} does not exist", path.display()))),
        Some(path) => Ok(LintConfig::load(path)),
    }
}

async fn write_line(out: &mut tokio::io::Stdout, response: &UiResponse) -> tokenlint::Result<()> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    out.write_all(line.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

async fn run(cli: Cli) -> tokenlint::Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let host = MemoryHost::load(&cli.document)?;
    let session = Session::with_config(host, &config);

    let mut stdout = tokio::io::stdout();
    write_line(&mut stdout, &session.api_check()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = session.handle_json(line).await;
        write_line(&mut stdout, &response).await?;
    }

    if let Some(path) = &cli.save {
        session.host().save(path)?;
        tracing::info!(path = %path.display(), "document saved");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    if let Err(err) = run(cli).await {
        tracing::error!(%err, "tokenlint failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
