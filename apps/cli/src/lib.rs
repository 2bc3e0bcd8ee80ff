//! # Basket CLI Library
//!
//! Argument parsing and startup for the `basket` binary.
//!
//! ## Module Organization
//! ```text
//! basket_cli/
//! ├── lib.rs          ◄─── You are here (startup & dispatch)
//! └── commands/
//!     ├── mod.rs      ◄─── Command exports
//!     └── cart.rs     ◄─── Cart commands
//! ```
//!
//! ## Usage
//! ```bash
//! basket add --id A --title Apple --image-url /a.png --price 1.5
//! basket increment A
//! basket decrement A
//! basket show --json
//! basket --namespace kiosk show
//! ```

pub mod commands;

use basket_core::NewLineItem;
use basket_db::{Database, DbConfig};
use basket_store::{with_cart_scope, CartResult, CartStore, SqliteStorage, StoreConfig};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use commands::CartResponse;

#[derive(Debug, Parser)]
#[command(name = "basket")]
#[command(author, version, about = "Basket shopping cart")]
pub struct Cli {
    /// SQLite database file (default: platform data dir, or BASKET_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Application namespace the cart is stored under
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Config file (default: basket.toml in the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the cart as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product id
        #[arg(long)]
        id: String,

        /// Display title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long, default_value = "")]
        image_url: String,

        /// Unit price
        #[arg(long)]
        price: f64,
    },
    /// Add one unit to a line-item already in the cart
    Increment {
        /// Line-item id
        id: String,
    },
    /// Remove one unit from a line-item
    Decrement {
        /// Line-item id
        id: String,
    },
}

/// Runs one CLI invocation.
///
/// ## Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Load StoreConfig (file → BASKET_* env → --namespace)               │
/// │  2. Determine database path and connect (migrations run here)          │
/// │  3. Spawn the CartStore; hydration starts in the background            │
/// │  4. Run the command inside the cart scope                              │
/// │  5. Shut the store down, read the slot's last write time               │
/// │  6. Close the pool, print the cart                                     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let response = invoke(cli).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", response);
    }

    Ok(())
}

async fn invoke(cli: Cli) -> Result<CartResponse, Box<dyn std::error::Error>> {
    let mut config = StoreConfig::load(cli.config)?;
    if let Some(namespace) = cli.namespace {
        config.namespace = namespace;
    }

    let db_path = get_database_path(cli.db)?;
    info!(?db_path, "Database path determined");

    let key = config.storage_key();
    let db = Database::new(DbConfig::new(db_path)).await?;
    let cart = CartStore::spawn(SqliteStorage::new(db.clone()), config)?;

    let result = with_cart_scope(cart.clone(), execute(cli.command)).await;

    cart.shutdown().await?;
    let saved_at = db.kv().updated_at(&key).await;
    db.close().await;

    Ok(result?.with_saved_at(saved_at?.map(|at| at.to_rfc3339())))
}

async fn execute(command: Commands) -> CartResult<CartResponse> {
    match command {
        Commands::Show => commands::cart::show().await,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => commands::cart::add_to_cart(NewLineItem::new(id, title, image_url, price)).await,
        Commands::Increment { id } => commands::cart::increment(id).await,
        Commands::Decrement { id } => commands::cart::decrement(id).await,
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout carries only the cart.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=basket=trace` - Show trace for basket crates only
/// - Default: WARN, INFO for basket crates
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,basket=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines the database file path.
///
/// ## Resolution Order
/// 1. `--db` argument
/// 2. `BASKET_DB_PATH` environment variable
/// 3. Platform data directory:
///    - **macOS**: `~/Library/Application Support/dev.basket.basket/basket.db`
///    - **Windows**: `%APPDATA%\basket\basket\data\basket.db`
///    - **Linux**: `~/.local/share/basket/basket.db`
pub fn get_database_path(explicit: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    if let Ok(path) = std::env::var("BASKET_DB_PATH") {
        debug!(path = %path, "Using database path from environment");
        return Ok(PathBuf::from(path));
    }

    let proj_dirs = ProjectDirs::from("dev", "basket", "basket")
        .ok_or("Could not determine app data directory")?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("basket.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_add() {
        let cli = parse(&[
            "basket", "add", "--id", "A", "--title", "Apple", "--price", "1.5",
        ]);

        match cli.command {
            Commands::Add {
                id,
                image_url,
                price,
                ..
            } => {
                assert_eq!(id, "A");
                assert_eq!(image_url, "");
                assert_eq!(price, 1.5);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = parse(&["basket", "show", "--json", "--namespace", "kiosk"]);

        assert!(cli.json);
        assert_eq!(cli.namespace.as_deref(), Some("kiosk"));
        assert!(matches!(cli.command, Commands::Show));
    }

    #[test]
    fn test_add_requires_price() {
        assert!(Cli::try_parse_from(["basket", "add", "--id", "A", "--title", "Apple"]).is_err());
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let path = PathBuf::from("/tmp/explicit.db");

        assert_eq!(get_database_path(Some(path.clone())).unwrap(), path);
    }

    #[tokio::test]
    async fn test_run_persists_between_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("basket.db");
        let db = db.to_str().unwrap();
        let config = dir.path().join("basket.toml");
        let config = config.to_str().unwrap();

        for args in [
            vec!["basket", "--db", db, "--config", config, "add", "--id", "A", "--title", "Apple", "--price", "1.5"],
            vec!["basket", "--db", db, "--config", config, "increment", "A"],
        ] {
            run(parse(&args)).await.unwrap();
        }

        let db = Database::new(DbConfig::new(db)).await.unwrap();
        let blob = db.kv().get("basket:products").await.unwrap().unwrap();
        let items = basket_core::codec::decode(&blob).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_saved_at_follows_writes() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("basket.db");
        let db = db.to_str().unwrap();
        let config = dir.path().join("basket.toml");
        let config = config.to_str().unwrap();

        let fresh = invoke(parse(&["basket", "--db", db, "--config", config, "show"]))
            .await
            .unwrap();
        assert_eq!(fresh.saved_at, None);

        let added = invoke(parse(&[
            "basket", "--db", db, "--config", config, "add", "--id", "A", "--title", "Apple", "--price", "1.5",
        ]))
        .await
        .unwrap();
        let saved_at = added.saved_at.clone().expect("slot written");

        assert!(looks_like_rfc3339(&saved_at));
        assert!(added.to_string().contains("Last saved"));
    }

    fn looks_like_rfc3339(timestamp: &str) -> bool {
        timestamp.len() >= 20 && timestamp.as_bytes()[4] == b'-' && timestamp.contains('T')
    }

    #[tokio::test]
    async fn test_run_rejects_bad_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("basket.db");
        let config = dir.path().join("basket.toml");

        let cli = parse(&[
            "basket",
            "--db",
            db.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--namespace",
            "a:b",
            "show",
        ]);

        assert!(run(cli).await.is_err());
    }
}
