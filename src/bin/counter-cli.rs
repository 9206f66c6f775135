use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use cors_proxy::config::{load_config, CounterBackend};
use cors_proxy::counter::{FileStore, KvStore, RequestCounter, TOTAL_REQUESTS_KEY};

#[derive(Parser)]
#[command(name = "counter-cli")]
#[command(about = "Inspect the request counter of a file-backed CORS proxy", long_about = None)]
struct Cli {
    /// Counter store file. Defaults to counter.path from --config.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Proxy configuration file to read the counter path from.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the number of forwarded requests
    Show,
    /// Set the counter back to zero
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let path = resolve_store_path(&cli)?;
    let store = Arc::new(FileStore::new(path));

    match cli.command {
        Commands::Show => {
            let counter = RequestCounter::new(store.clone());
            println!("{}", counter.read().await?);
        }
        Commands::Reset => {
            store.put(TOTAL_REQUESTS_KEY, "0".to_string()).await?;
            println!("Counter reset in {}", store.path().display());
        }
    }

    Ok(())
}

fn resolve_store_path(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(file) = &cli.file {
        return Ok(file.clone());
    }
    let Some(config_path) = &cli.config else {
        return Err("either --file or --config is required".into());
    };

    let config = load_config(config_path)?;
    match (config.counter.backend, config.counter.path) {
        (CounterBackend::File, Some(path)) => Ok(PathBuf::from(path)),
        (backend, _) => Err(format!("counter backend is {:?}, not a file store", backend).into()),
    }
}
