use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskd::{
    client::{
        sync::{Notification, Notifier, Severity, SyncClient},
        HttpTasksApi,
    },
    config::DaemonConfig,
    rest,
    store::TaskStore,
    AppContext,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

#[derive(Parser)]
#[command(name = "taskd", about = "taskd — single-user task tracker daemon", version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// REST API port
    #[arg(long, env = "TASKD_PORT")]
    port: Option<u16>,

    /// Data directory for tasks.json and config.toml
    #[arg(long, env = "TASKD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKD_LOG")]
    log: Option<String>,

    /// Bind address for the REST server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TASKD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "TASKD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the daemon server (default when no subcommand given).
    Serve,
    /// List tasks from a running daemon.
    List {
        /// Case-insensitive substring filter on title or id.
        #[arg(long)]
        filter: Option<String>,
        /// Emit raw JSON instead of one line per task.
        #[arg(long)]
        json: bool,
    },
    /// Add a task.
    Add { title: String },
    /// Flip a task's completed flag.
    Toggle { id: String },
    /// Delete a task.
    Rm { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Arc::new(DaemonConfig::new(
        args.port,
        args.data_dir,
        args.log,
        args.bind_address,
    ));

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(config, args.log_file.as_deref()).await,
        Command::List { filter, json } => run_list(&config, filter.as_deref(), json).await,
        Command::Add { title } => run_add(&config, &title).await,
        Command::Toggle { id } => run_toggle(&config, &id).await,
        Command::Rm { id } => run_rm(&config, &id).await,
    }
}

// ── serve ─────────────────────────────────────────────────────────────────────

async fn run_serve(config: Arc<DaemonConfig>, log_file: Option<&std::path::Path>) -> Result<()> {
    let _log_guard = setup_logging(&config.log_level, log_file);

    info!(
        data_dir = %config.data_dir.display(),
        port = config.port,
        "starting taskd v{}",
        env!("CARGO_PKG_VERSION")
    );

    let store = Arc::new(TaskStore::new(&config.data_dir));
    let ctx = Arc::new(AppContext::new(config, store));
    rest::start_rest_server(ctx).await
}

/// Initialize tracing with an EnvFilter level and optionally a daily-rotated
/// log file. Returns a guard that must stay alive for the process lifetime.
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("taskd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        tracing_subscriber::registry()
            .with(EnvFilter::new(log_level))
            .with(fmt::layer().compact())
            .with(fmt::layer().with_writer(non_blocking))
            .init();

        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}

// ── client commands ───────────────────────────────────────────────────────────

fn make_client(config: &DaemonConfig) -> (SyncClient<HttpTasksApi>, UnboundedReceiver<Notification>) {
    let api = HttpTasksApi::new(config.api_base_url());
    let (notifier, rx) = Notifier::channel();
    (SyncClient::new(api, notifier), rx)
}

/// Print queued notifications; return an error if any of them was an Error so
/// the process exits non-zero.
fn report(rx: &mut UnboundedReceiver<Notification>) -> Result<()> {
    let mut failed: Option<String> = None;
    while let Ok(n) = rx.try_recv() {
        match n.severity {
            Severity::Error => {
                eprintln!("error: {}: {}", n.summary, n.detail);
                failed.get_or_insert(n.detail);
            }
            Severity::Warn => eprintln!("warn: {}: {}", n.summary, n.detail),
            _ => println!("{}: {}", n.summary, n.detail),
        }
    }
    if let Some(detail) = failed {
        bail!("{detail}");
    }
    Ok(())
}

async fn run_list(config: &DaemonConfig, filter: Option<&str>, json: bool) -> Result<()> {
    let (mut client, mut rx) = make_client(config);
    client.reload().await;
    report(&mut rx)?;

    if let Some(q) = filter {
        client.set_filter(q);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(client.filtered_tasks())?);
    } else {
        for task in client.filtered_tasks() {
            let mark = if task.completed { "x" } else { " " };
            println!("[{mark}] {}  {}", task.id, task.title);
        }
    }
    Ok(())
}

async fn run_add(config: &DaemonConfig, title: &str) -> Result<()> {
    if title.trim().is_empty() {
        bail!("title must not be empty");
    }
    let (mut client, mut rx) = make_client(config);
    client.create(title).await;
    report(&mut rx)
}

async fn run_toggle(config: &DaemonConfig, id: &str) -> Result<()> {
    let (mut client, mut rx) = make_client(config);
    client.reload().await;
    report(&mut rx)?;

    let current = match client.tasks().iter().find(|t| t.id == id) {
        Some(t) => t.completed,
        None => bail!("no task with id {id}"),
    };
    client.toggle_completed(id, !current).await;
    report(&mut rx)
}

async fn run_rm(config: &DaemonConfig, id: &str) -> Result<()> {
    let (mut client, mut rx) = make_client(config);
    client.delete(id).await;
    report(&mut rx)
}
