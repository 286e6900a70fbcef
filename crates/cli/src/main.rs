//! Gallery CLI - database management and a command-line shop client.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! gallery migrate
//!
//! # Create an admin user
//! gallery user create -e admin@example.com -n "Admin Name" -r admin
//!
//! # Seed the catalog
//! gallery seed catalog.yaml --artist admin@example.com
//!
//! # Shop
//! gallery login -e ada@example.com
//! gallery browse --search harbour
//! gallery cart add 4
//! gallery checkout --street "1 Quay St" --city Hull --state "East Riding" \
//!     --zip "HU1 1AA" --country UK
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create|promote` - Manage accounts
//! - `seed` - Insert artworks from a YAML file
//! - `login`, `logout`, `browse`, `cart`, `checkout`, `orders` - Client store
//!
//! Shop commands keep their state in a JSON file (`--store`, default
//! `.gallery-store.json`) and talk to the API at `--api-url`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use gallery_api::models::ShippingAddress;
use gallery_core::{ArtworkId, PaymentMethod};

mod client;
mod commands;
mod store;

use client::{CatalogQuery, DEFAULT_API_URL};
use store::{DEFAULT_STORE_FILE, Store};

#[derive(Parser)]
#[command(name = "gallery")]
#[command(author, version, about = "Gallery shop CLI tools")]
struct Cli {
    /// Base URL of the gallery API
    #[arg(long, global = true, env = "GALLERY_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Path of the local client store
    #[arg(long, global = true, env = "GALLERY_STORE", default_value = DEFAULT_STORE_FILE)]
    store: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Insert artworks from a YAML file
    Seed {
        /// Path to the seed file
        file: String,

        /// Email of the artist account (overrides the file)
        #[arg(short, long)]
        artist: Option<String>,
    },
    /// Sign in and store the token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "GALLERY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token
    Logout,
    /// List artworks and cache the page
    Browse {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        price_min: Option<String>,
        #[arg(long)]
        price_max: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// Sort field, `-` prefix for descending (e.g. `-price`)
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart
    Checkout {
        #[arg(long)]
        street: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        zip: String,
        #[arg(long)]
        country: String,
        /// `credit_card`, `paypal` or `bank_transfer`
        #[arg(long, default_value = "credit_card")]
        method: PaymentMethod,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List your orders
    Orders,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 6 characters)
        #[arg(short, long, env = "GALLERY_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Role (`user`, `admin`)
        #[arg(short, long, default_value = "user")]
        role: String,
    },
    /// Change the role of an existing user
    Promote {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, default_value = "admin")]
        role: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add an artwork
    Add {
        id: ArtworkId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove an artwork
    Remove { id: ArtworkId },
    /// Set the quantity of an artwork (0 removes it)
    Update { id: ArtworkId, quantity: u32 },
    /// Show the cart
    Show,
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gallery_cli=info,gallery_api=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let api_url = cli.api_url.as_str();
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                password,
                role,
            } => {
                commands::users::create_user(&email, &name, &password, &role).await?;
            }
            UserAction::Promote { email, role } => {
                commands::users::set_role(&email, &role).await?;
            }
        },
        Commands::Seed { file, artist } => {
            commands::seed::catalog(&file, artist.as_deref()).await?;
        }
        Commands::Login { email, password } => {
            let mut store = Store::open(&cli.store)?;
            commands::shop::login(api_url, &mut store, &email, &password).await?;
        }
        Commands::Logout => commands::shop::logout(&mut Store::open(&cli.store)?)?,
        Commands::Browse {
            category,
            price_min,
            price_max,
            search,
            sort,
            page,
            limit,
        } => {
            let query = CatalogQuery {
                category,
                price_min,
                price_max,
                search,
                sort,
                page,
                limit,
            };
            let mut store = Store::open(&cli.store)?;
            commands::shop::browse(api_url, &mut store, &query).await?;
        }
        Commands::Cart { action } => {
            let mut store = Store::open(&cli.store)?;
            match action {
                CartAction::Add { id, quantity } => {
                    commands::shop::cart_add(api_url, &mut store, id, quantity).await?;
                }
                CartAction::Remove { id } => commands::shop::cart_remove(&mut store, id)?,
                CartAction::Update { id, quantity } => {
                    commands::shop::cart_update(&mut store, id, quantity)?;
                }
                CartAction::Show => commands::shop::cart_show(&store),
                CartAction::Clear => commands::shop::cart_clear(&mut store)?,
            }
        }
        Commands::Checkout {
            street,
            city,
            state,
            zip,
            country,
            method,
            notes,
        } => {
            let address = ShippingAddress {
                street,
                city,
                state,
                zip_code: zip,
                country,
            };
            let mut store = Store::open(&cli.store)?;
            commands::shop::checkout(api_url, &mut store, address, method, notes).await?;
        }
        Commands::Orders => commands::shop::orders(api_url, &Store::open(&cli.store)?).await?,
    }
    Ok(())
}
