//! Todo stack server binary.
//!
//! ```text
//! todo-stack api        API gateway on PORT (default 3001)
//! todo-stack frontend   static assets + /api proxy on PORT (default 80)
//! ```
//!
//! Startup order: env file → config → validation → logging → metrics → bind →
//! serve until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use todo_stack::config::{self, Process, StackConfig};
use todo_stack::http::mongo_lifecycle;
use todo_stack::lifecycle::{wait_for_signal, Shutdown};
use todo_stack::observability::{logging, metrics};
use todo_stack::{ApiServer, FrontendHost, RouteGroups, ServerError};

#[derive(Parser)]
#[command(name = "todo-stack", version)]
#[command(about = "API gateway and frontend host for the todo application", long_about = None)]
struct Cli {
    /// TOML config file. Environment variables override its values.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dotenv file to load before reading configuration (default: ./.env if present).
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API gateway
    Api,
    /// Serve the built frontend and proxy API traffic
    Frontend,
}

impl Commands {
    fn process(&self) -> Process {
        match self {
            Commands::Api => Process::Api,
            Commands::Frontend => Process::Frontend,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(path) = &cli.env_file {
        if let Err(e) = dotenvy::from_path(path) {
            eprintln!("failed to load env file {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    } else {
        dotenvy::dotenv().ok();
    }

    let process = cli.command.process();
    let config = match load(&cli, process) {
        Ok(config) => config,
        Err(e) => {
            for line in e.diagnostics() {
                eprintln!("{}", line);
            }
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability, config.environment);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "todo-stack starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let result = match process {
        Process::Api => run_api(config).await,
        Process::Frontend => run_frontend(config).await,
    };

    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

fn load(cli: &Cli, process: Process) -> Result<StackConfig, ServerError> {
    Ok(config::load_config(cli.config.as_deref(), process)?)
}

async fn run_api(config: StackConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(&config.api.bind_address).await?;
    let lifecycle = mongo_lifecycle(&config);
    tracing::info!(
        uri = %lifecycle.target().redacted_uri(),
        transport = %lifecycle.target().transport,
        "Database connection deferred until first request"
    );

    let shutdown = Shutdown::new();
    let server = ApiServer::new(config, lifecycle, RouteGroups::new());
    let rx = shutdown.subscribe();
    tokio::spawn(wait_for_signal(shutdown));

    server.run(listener, rx).await?;
    Ok(())
}

async fn run_frontend(config: StackConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(&config.frontend.bind_address).await?;
    let host = FrontendHost::new(config)?;

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(wait_for_signal(shutdown));

    host.run(listener, rx).await?;
    Ok(())
}
