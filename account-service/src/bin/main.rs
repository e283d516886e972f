use clap::{Parser, Subcommand};
use common::db::{init_db_pool, migrations_dir, run_migrations};
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Account Service CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set the log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Commands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the SQL migrations that create the users and accounts tables
    Migrate {
        /// Database URL
        #[arg(short, long, env = "DATABASE_URL")]
        database_url: String,

        /// Database pool size
        #[arg(short, long, default_value_t = 1)]
        pool_size: u32,
    },
    /// Print where migrations are read from
    MigrationsDir,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "account_service={level},common={level}",
            level = cli.log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Migrate { database_url, pool_size } => {
            let pool = init_db_pool(&database_url, pool_size).await?;
            run_migrations(&pool).await?;
            info!("Migrations applied");
        }
        Commands::MigrationsDir => {
            println!("{}", migrations_dir()?.display());
        }
    }

    Ok(())
}
