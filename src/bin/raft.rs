use std::io;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log;
use simple_logger;

use raftstore_cli::config::{self, ClientConfig, FieldCase, UploadMode};
use raftstore_cli::dispatch::{self, USAGE};
use raftstore_cli::{ClientError, RaftStoreClient, Result};

#[derive(Parser)]
#[command(version, about = "raftstore HTTP client", long_about = None)]
struct Cli {
    /// Command to run: get, set, setp, rm, rng, se or stat
    command: Option<String>,
    /// Positional command arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
    /// Database API base URL
    #[arg(short, long, env = "RAFTSTORE_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,
    /// Basic auth user
    #[arg(short, long, env = "RAFTSTORE_USER")]
    user: Option<String>,
    /// Basic auth password
    #[arg(short, long, env = "RAFTSTORE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Casing of request field names
    #[arg(long, env = "RAFTSTORE_FIELD_CASE", default_value = "lower")]
    field_case: FieldCase,
    /// Strategy used by `setp`
    #[arg(long, env = "RAFTSTORE_UPLOAD_MODE", default_value = "content-addressed")]
    upload_mode: UploadMode,
    /// Request timeout in seconds
    #[arg(short, long, env = "RAFTSTORE_TIMEOUT")]
    timeout: Option<u64>,
    /// Set log level
    #[arg(short, long, env = "RAFTSTORE_LOG_LEVEL", default_value = "warning")]
    log_level: LogLevel,
}

#[derive(Clone, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::new(cli.base_url)
        .with_field_case(cli.field_case)
        .with_upload_mode(cli.upload_mode)
        .with_timeout(cli.timeout.map(Duration::from_secs));
    if let Some(user) = cli.user {
        config = config.with_credentials(user, cli.password);
    }

    let command = match cli.command {
        Some(name) => dispatch::parse_command(&name, &cli.args, config.upload_mode)?,
        None => return Err(ClientError::usage("")),
    };

    let client = RaftStoreClient::new(&config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    dispatch::execute(&client, &command, &mut out)
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.log_level {
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Warning => log::LevelFilter::Warn,
        LogLevel::Error => log::LevelFilter::Error,
    };
    if let Err(err) = simple_logger::SimpleLogger::new().with_level(log_level).init() {
        eprintln!("Cannot initialize logger: {}", err);
    }

    match run(cli) {
        Ok(()) => {}
        Err(ClientError::Usage(message)) => {
            if !message.is_empty() {
                println!("{}", message);
            }
            println!("{}", USAGE);
            std::process::exit(1);
        }
        Err(err) => {
            log::debug!("{:?}", err);
            println!("{}", err);
            std::process::exit(1);
        }
    }
}
