/// Version injected at compile time via HCI_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("HCI_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use hci_client::api::{ApiClient, HciClient, Options};
use hci_client::config::ClientConfig;
use hci_client::error::describe_error;
use hci_client::services::{EntityApi, EntityContext, EntityService, TaskApi, TaskService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command-line client for the HCI provisioning API
#[derive(Parser, Debug)]
#[command(name = "hci", version = VERSION, about, long_about = None)]
struct Cli {
    /// API base endpoint (overrides config file and HCI_API_URL)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// API key (overrides config file and HCI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

/// Provisioning scope of an entity command
#[derive(Args, Debug)]
struct Scope {
    /// Service code, e.g. compute-east
    service_code: String,
    /// Environment name
    environment: String,
    /// Entity type, e.g. baremetals
    entity_type: String,
}

impl Scope {
    fn context(&self) -> EntityContext {
        EntityContext::new(&self.service_code, &self.environment, &self.entity_type)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one entity
    Get {
        #[command(flatten)]
        scope: Scope,
        id: String,
    },
    /// List entities
    List {
        #[command(flatten)]
        scope: Scope,
        /// Query option as key=value (repeatable)
        #[arg(short = 'o', long = "option", value_parser = parse_option)]
        options: Vec<(String, String)>,
    },
    /// Run an operation (start, stop, reboot, ...) on an entity
    Exec {
        #[command(flatten)]
        scope: Scope,
        id: String,
        operation: String,
        /// JSON body sent with the operation
        #[arg(long)]
        body: Option<String>,
        /// Wait for the task the operation starts
        #[arg(long)]
        wait: bool,
    },
    /// Show a task
    Task { id: String },
    /// Save endpoint, API key and poll settings to the config file
    Configure {
        /// Poll interval in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,
        #[arg(long)]
        max_attempts: Option<u32>,
    },
    /// Poll a task until it finishes
    Poll {
        id: String,
        /// Override the configured attempt budget
        #[arg(long)]
        max_attempts: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_option(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("hci {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("hci").join("hci.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".hci").join("hci.log");
    }
    PathBuf::from("hci.log")
}

/// Keep the full error in the log, show the user a short message
fn friendly(error: hci_client::Error) -> anyhow::Error {
    tracing::error!("{}", error);
    anyhow::anyhow!(describe_error(&error))
}

/// Print a JSON payload, pretty when it parses
fn print_payload(data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    match serde_json::from_slice::<serde_json::Value>(data) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{}", String::from_utf8_lossy(data)),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_level)?;

    let mut config = ClientConfig::load().map_err(friendly)?;
    if let Some(endpoint) = cli.endpoint {
        config.base_endpoint = endpoint;
    }
    if let Some(api_key) = cli.api_key {
        config.api_key = api_key;
    }
    tracing::debug!("Using {:?}", config);

    if let Command::Configure {
        poll_interval_ms,
        max_attempts,
    } = cli.command
    {
        if let Some(ms) = poll_interval_ms {
            config.poll_interval = std::time::Duration::from_millis(ms);
        }
        if let Some(attempts) = max_attempts {
            config.max_attempts = attempts;
        }
        config.validate().map_err(friendly)?;
        config.save().map_err(friendly)?;
        if let Some(path) = ClientConfig::config_path() {
            println!("Saved {}", path.display());
        }
        return Ok(());
    }

    let client: Arc<dyn ApiClient> = Arc::new(HciClient::new(&config).map_err(friendly)?);
    let tasks = TaskApi::from_config(client.clone(), &config);

    match cli.command {
        Command::Get { scope, id } => {
            let entities = EntityApi::new(client, scope.context());
            let data = entities.get(&id, &Options::new()).await.map_err(friendly)?;
            print_payload(&data)?;
        },
        Command::List { scope, options } => {
            let entities = EntityApi::new(client, scope.context());
            let options: Options = options.into_iter().collect();
            let data = entities.list(&options).await.map_err(friendly)?;
            print_payload(&data)?;
        },
        Command::Exec {
            scope,
            id,
            operation,
            body,
            wait,
        } => {
            let mut entities = EntityApi::new(client, scope.context());
            if wait {
                entities = entities.with_task_wait(tasks, config.max_attempts);
            }
            let body = match body {
                Some(raw) => {
                    serde_json::from_str::<serde_json::Value>(&raw)
                        .context("--body must be valid JSON")?;
                    raw.into_bytes()
                },
                None => Vec::new(),
            };
            let data = entities
                .execute(&id, &operation, body, &Options::new())
                .await
                .map_err(friendly)?;
            print_payload(&data)?;
        },
        Command::Task { id } => {
            let task = tasks.get(&id).await.map_err(friendly)?;
            let result = task
                .result
                .as_deref()
                .map(serde_json::from_slice::<serde_json::Value>)
                .transpose()
                .context("Task result is not valid JSON")?;
            let summary = serde_json::json!({
                "id": task.id,
                "status": task.status.to_string(),
                "created": task.created,
                "result": result,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        },
        Command::Poll { id, max_attempts } => {
            let max_attempts = max_attempts.unwrap_or(config.max_attempts);
            let data = tasks.poll(&id, max_attempts).await.map_err(friendly)?;
            print_payload(&data)?;
        },
        Command::Configure { .. } => {},
    }

    Ok(())
}
