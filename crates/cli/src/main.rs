//! Watch Shop CLI - inspect and edit the persisted cart and favorites.
//!
//! # Usage
//!
//! ```bash
//! # Add a watch to the cart (a second add bumps the quantity)
//! watchshop cart add --id 1 --name "Seamaster 300" --price 4200 --image https://cdn.example/1.jpg
//!
//! # Change or drop a line
//! watchshop cart set-quantity 1 3
//! watchshop cart set-quantity 1 0
//!
//! # Favorites take the same product flags, or a JSON record
//! watchshop favorites add --json '{"id":2,"name":"Luminor","price":"7900","image":"u"}'
//!
//! # Place an order for the cart, then list past orders
//! watchshop checkout
//! watchshop orders
//! ```
//!
//! # Environment Variables
//!
//! - `WATCHSHOP_DATA_DIR` - Directory holding the persisted collections
//! - `WATCHSHOP_USER_ID` - Signed-in customer, required by `checkout` and `orders`
//! - `WATCHSHOP_BACKEND_URL` / `WATCHSHOP_BACKEND_ANON_KEY` - Order backend
//! - `SENTRY_DSN` - Error reporting (optional)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use watchshop_core::ProductId;
use watchshop_store::storage::FileStorage;
use watchshop_store::{CartStore, StoreConfig};

mod commands;
mod output;

use commands::{CliError, ProductArgs};

#[derive(Parser)]
#[command(name = "watchshop")]
#[command(author, version, about = "Watch Shop cart and favorites")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Place an order for the current cart
    Checkout,
    /// List past orders, newest first
    Orders,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines
    List,
    /// Add one unit of a product
    Add(ProductArgs),
    /// Remove a product's line
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set a line's quantity (zero or less removes the line)
    SetQuantity {
        /// Product ID
        id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
    /// Show line count, item count and subtotal
    Summary,
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Show favorites
    List,
    /// Add a product to favorites
    Add(ProductArgs),
    /// Remove a product from favorites
    Remove {
        /// Product ID
        id: ProductId,
    },
}

fn init_sentry(config: &StoreConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the subscriber
    let sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "watchshop_store=info,watchshop_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        // exit() skips destructors; flush pending Sentry events first
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StoreConfig) -> Result<(), CliError> {
    let storage = FileStorage::new(config.data_dir.clone());
    let store = CartStore::open(storage, config.store_options()).await;
    let currency = config.currency;

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&store, currency),
            CartAction::Add(product) => commands::cart::add(&store, product).await?,
            CartAction::Remove { id } => commands::cart::remove(&store, id).await?,
            CartAction::SetQuantity { id, quantity } => {
                commands::cart::set_quantity(&store, id, quantity).await?;
            }
            CartAction::Clear => commands::cart::clear(&store).await?,
            CartAction::Summary => commands::cart::summary(&store, currency),
        },
        Commands::Favorites { action } => match action {
            FavoritesAction::List => commands::favorites::list(&store, currency),
            FavoritesAction::Add(product) => commands::favorites::add(&store, product).await?,
            FavoritesAction::Remove { id } => commands::favorites::remove(&store, id).await?,
        },
        Commands::Checkout => commands::orders::checkout(&store, config).await?,
        Commands::Orders => commands::orders::history(config).await?,
    }

    commands::finish(&store).await
}
