//! Discount commands.

use tableside_cart::DiscountOutcome;
use tableside_core::format_price;

use super::{CommandError, DiscountAction, open_session};
use crate::config::CliConfig;

/// Run a discount command.
///
/// # Errors
///
/// Returns an error if the session cannot be opened or the code is rejected.
pub async fn run(config: &CliConfig, action: DiscountAction) -> Result<(), CommandError> {
    match action {
        DiscountAction::Apply { session, code } => {
            let store = open_session(config, &session).await?;
            let outcome = store.apply_discount_code(&code).await;
            store.flush().await;

            match outcome {
                DiscountOutcome::Applied(_) => {
                    let totals = store.totals();
                    #[allow(clippy::print_stdout)]
                    {
                        println!(
                            "Applied {}: {} off, total {}",
                            store.discount_code(),
                            format_price(totals.discount_amount),
                            format_price(totals.final_total)
                        );
                    }
                }
                DiscountOutcome::Rejected { reason } => {
                    return Err(CommandError::DiscountRejected(reason));
                }
            }
        }
        DiscountAction::Remove { session } => {
            let store = open_session(config, &session).await?;
            store.remove_discount();
            store.flush().await;

            #[allow(clippy::print_stdout)]
            {
                println!("Discount removed, total {}", format_price(store.total()));
            }
        }
    }
    Ok(())
}
