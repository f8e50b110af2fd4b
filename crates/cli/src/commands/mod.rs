//! Command implementations.
//!
//! Every cart or discount command opens a file-backed [`CartStore`], observes
//! the session given on the command line, waits for its stored cart, applies
//! one operation and flushes before returning.

pub mod cart;
pub mod discount;

use std::str::FromStr;
use std::sync::Arc;

use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use tableside_cart::{
    CachedDiscounts, CartStore, DiscountError, FileStorage, PromotionBook, StoreOptions,
};
use tableside_core::{AddOn, ItemId, SessionIdentity, SessionKey};

use crate::config::{CliConfig, ConfigError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Promotion codes file could not be read.
    #[error("Failed to read discounts file: {0}")]
    Io(#[from] std::io::Error),

    /// Promotion codes file is malformed.
    #[error("Invalid discounts file: {0}")]
    Discounts(#[from] DiscountError),

    /// The command needs a table, customer or ticket.
    #[error("No session given; pass --table, --customer or --ticket")]
    NoSession,

    /// No cart line has the given catalog id.
    #[error("No item with id {0} in the cart")]
    UnknownItem(ItemId),

    /// The discount code was rejected.
    #[error("Discount rejected: {0}")]
    DiscountRejected(String),
}

/// Session selectors shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct SessionArgs {
    /// Dine-in table number
    #[arg(long)]
    pub table: Option<String>,

    /// Take-out customer name
    #[arg(long)]
    pub customer: Option<String>,

    /// Legacy ticket number
    #[arg(long)]
    pub ticket: Option<String>,
}

impl SessionArgs {
    /// The identity tuple these selectors describe.
    #[must_use]
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            table_number: self.table.clone(),
            customer_name: self.customer.clone(),
            ticket_number: self.ticket.clone(),
            order_mode: None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CartAction {
    /// Show the cart and its totals
    Show {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Add an item to the cart
    Add {
        #[command(flatten)]
        session: SessionArgs,

        /// Catalog item id
        #[arg(long, value_parser = ItemId::parse)]
        item: ItemId,

        /// Display name
        #[arg(long, default_value = "")]
        name: String,

        /// Base unit price
        #[arg(long)]
        price: Decimal,

        /// Units to add
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        qty: u32,

        /// Add-on as `id=price`; repeat for several
        #[arg(long = "add-on", value_parser = parse_add_on)]
        add_ons: Vec<AddOn>,

        /// Special instructions
        #[arg(long, default_value = "")]
        note: String,

        /// Per-unit price to record instead of base price plus add-ons
        #[arg(long)]
        unit_price: Option<Decimal>,
    },
    /// Remove every line with a catalog id
    Remove {
        #[command(flatten)]
        session: SessionArgs,

        /// Catalog item id
        #[arg(long, value_parser = ItemId::parse)]
        item: ItemId,
    },
    /// Set the quantity of the first line with a catalog id
    Qty {
        #[command(flatten)]
        session: SessionArgs,

        /// Catalog item id
        #[arg(long, value_parser = ItemId::parse)]
        item: ItemId,

        /// New quantity
        #[arg(long)]
        qty: u32,
    },
    /// Empty the cart and delete its stored copy
    Clear {
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum DiscountAction {
    /// Apply a discount code
    Apply {
        #[command(flatten)]
        session: SessionArgs,

        /// Discount code
        code: String,
    },
    /// Remove the discount code
    Remove {
        #[command(flatten)]
        session: SessionArgs,
    },
}

/// Parse an `id=price` add-on argument.
fn parse_add_on(value: &str) -> Result<AddOn, String> {
    let (id, price) = value
        .split_once('=')
        .ok_or_else(|| format!("expected id=price, got {value:?}"))?;

    let id = id.trim();
    if id.is_empty() {
        return Err(format!("add-on id is empty in {value:?}"));
    }
    let price = Decimal::from_str(price.trim())
        .map_err(|e| format!("invalid add-on price in {value:?}: {e}"))?;

    Ok(AddOn::new(id, price))
}

/// Print the storage key for the given session.
pub fn print_key(session: &SessionArgs) {
    let key = SessionKey::resolve(&session.identity());

    #[allow(clippy::print_stdout)]
    {
        println!("{key}");
    }
}

/// Open a store for `session` and wait for its stored cart.
///
/// # Errors
///
/// Returns an error if the session is anonymous or the promotion codes file
/// cannot be loaded.
pub async fn open_session(
    config: &CliConfig,
    session: &SessionArgs,
) -> Result<CartStore, CommandError> {
    let identity = session.identity();
    if identity.is_anonymous() {
        return Err(CommandError::NoSession);
    }

    let book = match &config.discounts_file {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            let book = PromotionBook::from_json(&json)?;
            info!(path = %path.display(), codes = book.len(), "Loaded promotion codes");
            book
        }
        None => PromotionBook::default(),
    };

    let store = CartStore::new(
        Arc::new(FileStorage::new(&config.data_dir)),
        Arc::new(CachedDiscounts::new(book, config.discount_cache_ttl)),
        StoreOptions {
            persist_debounce: config.persist_debounce,
        },
    );

    store.observe_session(&identity);
    store.wait_loaded().await;
    Ok(store)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct CartCli {
        #[command(subcommand)]
        action: CartAction,
    }

    fn parse_cart(args: &[&str]) -> Result<CartAction, clap::Error> {
        CartCli::try_parse_from(std::iter::once("cart").chain(args.iter().copied()))
            .map(|cli| cli.action)
    }

    #[test]
    fn test_add_parses_item_and_qty() {
        let action = parse_cart(&[
            "add", "--table", "5", "--item", "pho", "--price", "14.50", "--qty", "2",
        ])
        .unwrap();
        match action {
            CartAction::Add { item, qty, price, .. } => {
                assert_eq!(item, ItemId::new("pho"));
                assert_eq!(qty, 2);
                assert_eq!(price, Decimal::new(1450, 2));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_add_rejects_zero_qty() {
        let args = [
            "add", "--table", "5", "--item", "pho", "--price", "1", "--qty", "0",
        ];
        assert!(parse_cart(&args).is_err());
    }

    #[test]
    fn test_blank_item_id_is_rejected() {
        assert!(parse_cart(&["add", "--table", "5", "--item", "  ", "--price", "1"]).is_err());
        assert!(parse_cart(&["remove", "--table", "5", "--item", ""]).is_err());
        assert!(parse_cart(&["qty", "--table", "5", "--item", " ", "--qty", "2"]).is_err());
    }

    #[test]
    fn test_parse_add_on() {
        let add_on = parse_add_on("cheese=0.75").unwrap();
        assert_eq!(add_on.id.as_str(), "cheese");
        assert_eq!(add_on.price, Decimal::new(75, 2));
    }

    #[test]
    fn test_parse_add_on_trims_parts() {
        let add_on = parse_add_on(" bacon = 2 ").unwrap();
        assert_eq!(add_on.id.as_str(), "bacon");
        assert_eq!(add_on.price, Decimal::from(2));
    }

    #[test]
    fn test_parse_add_on_rejects_malformed() {
        assert!(parse_add_on("cheese").is_err());
        assert!(parse_add_on("=1").is_err());
        assert!(parse_add_on("cheese=free").is_err());
    }

    #[test]
    fn test_session_args_identity() {
        let args = SessionArgs {
            customer: Some("Jane Doe".to_string()),
            ..SessionArgs::default()
        };
        assert_eq!(
            SessionKey::resolve(&args.identity()).as_str(),
            "cart_customer_jane_doe"
        );
        assert!(SessionArgs::default().identity().is_anonymous());
    }
}
