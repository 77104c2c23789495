//! Atelier CLI - terminal front end for the storefront.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (prompts for the password on stdin when --password is omitted)
//! atelier auth login -u alice
//!
//! # Browse and shop
//! atelier products list
//! atelier cart add 65f1c0ffee
//! atelier cart show
//!
//! # Manage the catalog (admin accounts only)
//! atelier products add -n "Pearl Drop" -p 120 -i https://img.example/pearl.jpg
//! atelier products delete 65f1c0ffee
//! ```
//!
//! # Commands
//!
//! - `auth` - Sign in, register, sign out, show the current session
//! - `products` - List the catalog, add or delete products
//! - `cart` - Show the cart, add or remove items
//!
//! The session is stored in the same file as the `atelier-storefront` web UI,
//! so signing in here also signs in the browser UI on its next start.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "Atelier storefront from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, register or sign out
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Browse and manage the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Show and change the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Sign in and remember the session
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create a regular user account
    Register {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Password confirmation (defaults to the password)
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show whether a session is saved and its role
    Status,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List every product in the catalog
    List,
    /// Add a product (admin only)
    Add {
        /// Product name
        #[arg(short, long)]
        name: String,

        /// Price in dollars (e.g. 49.50)
        #[arg(short, long)]
        price: String,

        /// Image URL
        #[arg(short, long)]
        image: String,
    },
    /// Delete a product by ID (admin only)
    Delete {
        /// Product ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart contents and total
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        id: String,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), commands::CommandError> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let storefront = commands::connect().await?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login { username, password } => {
                let password = commands::password_or_prompt(password)?;
                commands::auth::login(&storefront, &username, password, &mut out).await?;
            }
            AuthAction::Register {
                username,
                password,
                confirm_password,
            } => {
                let password = commands::password_or_prompt(password)?;
                let confirm = confirm_password.unwrap_or_else(|| password.clone());
                commands::auth::register(&storefront, &username, password, &confirm, &mut out)
                    .await?;
            }
            AuthAction::Logout => commands::auth::logout(&storefront, &mut out).await?,
            AuthAction::Status => commands::auth::status(&storefront, &mut out)?,
        },
        Commands::Products { action } => match action {
            ProductsAction::List => commands::products::list(&storefront, &mut out).await?,
            ProductsAction::Add { name, price, image } => {
                commands::products::add(&storefront, &name, &price, &image, &mut out).await?;
            }
            ProductsAction::Delete { id } => {
                commands::products::delete(&storefront, &id, &mut out).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront, &mut out).await?,
            CartAction::Add { id } => commands::cart::add(&storefront, &id, &mut out).await?,
            CartAction::Remove { id } => {
                commands::cart::remove(&storefront, &id, &mut out).await?;
            }
        },
    }
    Ok(())
}
