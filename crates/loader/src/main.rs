use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use movies_db::PoolSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movies_loader::{load_movies, DEFAULT_BATCH_SIZE};

/// Load a MovieLens movies.csv into the movies table.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the CSV file (`movieId,title,genres`).
    #[arg(long, default_value = "data/movies.csv")]
    csv_path: PathBuf,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Rows per INSERT statement.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movies_loader=info,movies_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let file = File::open(&args.csv_path)
        .with_context(|| format!("cannot open {}", args.csv_path.display()))?;

    let settings = PoolSettings {
        max_connections: 2,
        min_connections: 1,
        ..PoolSettings::default()
    };
    let pool = movies_db::create_pool(&args.database_url, &settings)
        .await
        .context("failed to connect to database")?;

    movies_db::run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let summary = load_movies(&pool, file, args.batch_size)
        .await
        .with_context(|| format!("failed to load {}", args.csv_path.display()))?;

    tracing::info!(
        rows_read = summary.rows_read,
        rows_written = summary.rows_written,
        batches = summary.batches,
        "Inserted/updated movies"
    );

    pool.close().await;
    Ok(())
}
