use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use rock_migrations::{
    config::{Config, LogFormat},
    database::{Database, ledger::MigrationStatus, migrations, runner::MigrationRunner},
};

#[derive(Parser)]
#[command(name = "rock-migrate")]
#[command(version)]
#[command(about = "Apply, revert and inspect CMS schema and data migrations")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "rock-migrate.toml")]
    config: String,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level (overrides config file)
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log output format (overrides config file)
    #[arg(long, value_enum, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations in order
    Up {
        /// Apply at most this many migrations
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Revert the most recently applied migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// List every migration with its applied time
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Check migration names and ordering without touching the database
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
        config.validate()?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    init_tracing(&config)?;
    info!("rock-migrate v{}", env!("CARGO_PKG_VERSION"));
    migrations::configure(&config.migrations);

    if let Command::Verify = cli.command {
        let ids = MigrationRunner::verify()?;
        println!("{} migrations verified", ids.len());
        return Ok(());
    }

    let database = Database::new(&config.database).await?;
    let runner = database
        .runner()
        .with_name_verification(config.migrations.verify_names);

    match cli.command {
        Command::Up { steps } => {
            let report = runner.up(steps).await?;
            for version in &report.versions {
                println!("applied   {version}");
            }
            println!(
                "{} migration(s) applied in {}",
                report.versions.len(),
                humantime::format_duration(truncate_to_millis(report.elapsed))
            );
        }
        Command::Down { steps } => {
            let report = runner.down(steps).await?;
            for version in &report.versions {
                println!("reverted  {version}");
            }
            println!(
                "{} migration(s) reverted in {}",
                report.versions.len(),
                humantime::format_duration(truncate_to_millis(report.elapsed))
            );
        }
        Command::Status { json } => {
            let statuses = runner.status().await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&statuses).context("Failed to render status")?
                );
            } else {
                print_status_table(&statuses);
            }
        }
        Command::Verify => {}
    }

    Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
    let default_filter = format!(
        "rock_migrations={level},sea_orm_migration={level}",
        level = config.logging.level
    );
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_filter))
        .with_context(|| format!("Invalid log level '{}'", config.logging.level))?;

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
    Ok(())
}

fn print_status_table(statuses: &[MigrationStatus]) {
    let width = statuses
        .iter()
        .map(|s| s.version.len())
        .max()
        .unwrap_or(0);
    for status in statuses {
        let state = match (status.applied_at, status.unknown) {
            (Some(at), true) => format!("applied {} (unknown to this binary)", at.to_rfc3339()),
            (Some(at), false) => format!("applied {}", at.to_rfc3339()),
            (None, _) => "pending".to_string(),
        };
        println!("{:width$}  {}", status.version, state, width = width);
    }
}

fn truncate_to_millis(elapsed: std::time::Duration) -> std::time::Duration {
    std::time::Duration::from_millis(elapsed.as_millis() as u64)
}
