//! Cart commands.

use std::fmt::Write as _;

use tracing::info;

use tableside_cart::{AddItemOptions, CartState, CartStore, CartTotals};
use tableside_core::{MenuItem, format_price};

use super::{CartAction, CommandError, open_session};
use crate::config::CliConfig;

/// Run a cart command.
///
/// # Errors
///
/// Returns an error if the session cannot be opened or the item is unknown.
pub async fn run(config: &CliConfig, action: CartAction) -> Result<(), CommandError> {
    match action {
        CartAction::Show { session } => {
            let store = open_session(config, &session).await?;
            print_cart(&store);
        }
        CartAction::Add {
            session,
            item,
            name,
            price,
            qty,
            add_ons,
            note,
            unit_price,
        } => {
            let store = open_session(config, &session).await?;
            let mut options = AddItemOptions::default()
                .with_qty(qty)
                .with_add_ons(add_ons)
                .with_instructions(note);
            options.total_item_price = unit_price;

            store.add_item(&MenuItem::new(item.clone(), name, price), options);
            store.flush().await;
            info!(item = %item, qty, "Item added");
            print_cart(&store);
        }
        CartAction::Remove { session, item } => {
            let store = open_session(config, &session).await?;
            if store.remove_item(&item) == 0 {
                return Err(CommandError::UnknownItem(item));
            }
            store.flush().await;
            print_cart(&store);
        }
        CartAction::Qty { session, item, qty } => {
            let store = open_session(config, &session).await?;
            if !store.update_qty(&item, qty) {
                return Err(CommandError::UnknownItem(item));
            }
            store.flush().await;
            print_cart(&store);
        }
        CartAction::Clear { session } => {
            let store = open_session(config, &session).await?;
            store.clear().await;
            print_cart(&store);
        }
    }
    Ok(())
}

fn print_cart(store: &CartStore) {
    let key = store
        .active_key()
        .map_or_else(|| "(no session)".to_string(), |key| key.to_string());
    let output = render(&key, &store.state(), &store.totals());

    #[allow(clippy::print_stdout)]
    {
        print!("{output}");
    }
}

/// Format a cart for the terminal.
pub fn render(key: &str, state: &CartState, totals: &CartTotals) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{key}");

    if state.items.is_empty() {
        let _ = writeln!(out, "  (empty)");
    }

    for line in &state.items {
        let label = if line.name.is_empty() {
            line.id.to_string()
        } else {
            format!("{} ({})", line.name, line.id)
        };
        let _ = writeln!(
            out,
            "  {:>3} x {:<32} {:>10}",
            line.qty,
            label,
            format_price(line.line_total())
        );
        for add_on in &line.add_ons {
            let _ = writeln!(out, "        + {} {}", add_on.id, format_price(add_on.price));
        }
        if !line.special_instructions.is_empty() {
            let _ = writeln!(out, "        note: {}", line.special_instructions);
        }
    }

    let _ = writeln!(out, "Subtotal: {}", format_price(totals.subtotal));
    if !state.discount_code.is_empty() {
        let _ = writeln!(
            out,
            "Discount ({}): {}",
            state.discount_code,
            format_price(-totals.discount_amount)
        );
    }
    let _ = writeln!(out, "Total: {}", format_price(totals.final_total));
    out
}
