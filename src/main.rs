use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use artifact_store::config;
use artifact_store::storage::{ByteReader, ObjectRef, StorageManager};

/// Id the configured backend is registered under / 默认驱动实例名
const DRIVER_ID: &str = "default";

#[derive(Parser, Debug)]
#[command(author, version, about = "Build artifact object store")]
struct Cli {
    /// Configuration file (created with defaults when missing)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the backend health line
    Status,
    /// Upload a local file
    Store {
        path: String,
        name: String,
        file: PathBuf,
    },
    /// Download an object to a file, or stdout
    Fetch {
        path: String,
        name: String,
        out: Option<PathBuf>,
    },
    /// Delete an object
    Delete { path: String, name: String },
    /// Print a signed upload URL
    StoreUrl { path: String, name: String },
    /// Print a signed download URL
    FetchUrl { path: String, name: String },
    /// List available driver types and their settings
    Drivers,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artifact_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let manager = StorageManager::new();
    artifact_store::register_storage_drivers(&manager).await?;

    if let Command::Drivers = cli.command {
        for info in manager.driver_infos().await {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        return Ok(());
    }

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    config::init_config(&config_path)?;
    let app_config = config::config();
    let settings = &app_config.object_store;

    manager
        .create_driver(DRIVER_ID.to_string(), &settings.kind, settings.driver_config()?)
        .await?;
    let driver = manager
        .get_driver(DRIVER_ID)
        .await
        .context("driver not loaded")?;

    match cli.command {
        Command::Status => println!("{}", driver.status().await),
        Command::Store { path, name, file } => {
            let input = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("opening {:?}", file))?;
            let locator = driver
                .store(&ObjectRef::new(path, name), Box::new(input) as ByteReader)
                .await?;
            println!("{}", locator);
        }
        Command::Fetch { path, name, out } => {
            let mut reader = driver.fetch(&ObjectRef::new(path, name)).await?;
            let copied = match out {
                Some(out) => {
                    let mut file = tokio::fs::File::create(&out)
                        .await
                        .with_context(|| format!("creating {:?}", out))?;
                    tokio::io::copy(&mut reader, &mut file).await?
                }
                None => tokio::io::copy(&mut reader, &mut tokio::io::stdout()).await?,
            };
            tracing::info!("Fetched {} bytes", copied);
        }
        Command::Delete { path, name } => {
            driver.delete(&ObjectRef::new(path, name)).await?;
        }
        Command::StoreUrl { path, name } => {
            let signed = driver.store_url(&ObjectRef::new(path, name)).await?;
            println!("{}\n{}", signed.url, signed.token);
        }
        Command::FetchUrl { path, name } => {
            let signed = driver.fetch_url(&ObjectRef::new(path, name)).await?;
            println!("{}\n{}", signed.url, signed.token);
        }
        Command::Drivers => {}
    }

    Ok(())
}
