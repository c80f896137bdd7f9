// Stale Order Reaper - CLI
// Cancels resting orders that contradict the current SMA trend signal

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use stale_order_reaper::{logging, Config, ConfigError, LoggingConfig, ReaperError};

#[path = "../cli/run_commands.rs"]
mod run_commands;

#[derive(Parser)]
#[command(name = "reaper")]
#[command(version)]
#[command(about = "Cancels Kraken orders that contradict the current trend signal", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config.toml
    Init,

    /// Run the reconciliation loop until Ctrl+C
    Run {
        /// Log stale orders instead of cancelling them
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Run a single reconciliation pass
    Once {
        /// Log stale orders instead of cancelling them
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Show the current signal without touching orders
    Signal,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Credentials may live in .env
    dotenvy::dotenv().ok();

    if let Err(e) = dispatch(cli).await {
        error!(category = e.category(), "❌ {}", e);
        eprintln!("\n{}", e.user_message());
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> Result<(), ReaperError> {
    // Init needs no config (it creates it)
    if let Commands::Init = cli.command {
        let _guard = logging::init_logging(&LoggingConfig::default(), cli.verbose)?;
        return init_workspace(&cli.config);
    }

    // Public market data needs no keys
    let skip_api_keys = matches!(cli.command, Commands::Signal);
    let config = load_config(&cli.config, skip_api_keys)?;
    let _guard = logging::init_logging(&config.logging, cli.verbose)?;

    info!("🚀 Stale Order Reaper v{}", env!("CARGO_PKG_VERSION"));
    info!("📁 Config: {}", cli.config);

    match cli.command {
        Commands::Init => Ok(()), // handled above
        Commands::Run { dry_run } => run_commands::run_loop(&config, dry_run).await,
        Commands::Once { dry_run } => run_commands::run_once(&config, dry_run).await,
        Commands::Signal => run_commands::show_signal(&config).await,
    }
}

fn load_config(path: &str, skip_api_keys: bool) -> Result<Config, ReaperError> {
    match Config::load_or_error(path, skip_api_keys) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotInitialized(_)) => Err(ReaperError::ConfigNotFound(path.to_string())),
        Err(e) => Err(e.into()),
    }
}

fn init_workspace(config_path: &str) -> Result<(), ReaperError> {
    info!("🔧 Initializing workspace...");

    if std::path::Path::new(config_path).exists() {
        warn!("⚠️  {} already exists, skipping", config_path);
        return Ok(());
    }

    let default_config = include_str!("../../config.toml.example");
    std::fs::write(config_path, default_config)?;
    info!("📝 Created {}", config_path);

    info!("✅ Workspace initialized successfully!");
    info!("💡 Next steps:");
    info!("   1. Edit {} with your Kraken API keys (or set KRAKEN_API_KEY / KRAKEN_API_SECRET)", config_path);
    info!("   2. Run: reaper signal");
    info!("   3. Run: reaper run --dry-run");

    Ok(())
}
