//! # Basket CLI Entry Point
//!
//! ```bash
//! basket add --id A --title Apple --price 1.5
//! basket show
//! ```
//!
//! All logic lives in the library crate (`basket_cli`).

use clap::Parser;

use basket_cli::Cli;

#[tokio::main]
async fn main() {
    basket_cli::init_tracing();

    let cli = Cli::parse();

    if let Err(e) = basket_cli::run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}
