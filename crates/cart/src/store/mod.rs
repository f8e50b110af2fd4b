//! Session-scoped cart store.
//!
//! # State machine
//!
//! The store tracks two things besides the cart itself:
//!
//! - the **active key**, resolved from the session identity, together with a
//!   generation counter bumped on every key change
//! - the **load phase** of that key's stored cart (`Idle -> Loading -> Loaded`)
//!
//! A key change clears the in-memory cart synchronously and spawns a load for
//! the new key. The load yields once before reading so callers observe the
//! cleared cart first. Its result is tagged with the generation it was issued
//! for and dropped if the key changed again in the meantime.
//!
//! Mutations apply to memory immediately, even while a load is outstanding.
//! If the load resolves afterwards it replaces those changes (last writer
//! wins) and a warning is logged.
//!
//! # Persistence
//!
//! Each effective mutation schedules a write of the whole cart, debounced by
//! [`StoreOptions::persist_debounce`]. Writes are skipped while loading and
//! when there is no session. A pending write is flushed when the session
//! switches away, and [`CartStore::clear`] removes the stored cart at once.

mod state;
mod writer;

pub use state::{AddItemOptions, CartState, CartTotals, LoadPhase};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use tableside_core::{
    ItemId, LineItem, LineSignature, MenuItem, SessionIdentity, SessionKey, calculate_total_price,
};

use crate::blob::{self, PersistedCart};
use crate::discount::{DiscountEffect, DiscountOutcome, DiscountRecord, DiscountService};
use crate::storage::CartStorage;

use writer::{StorageOp, StorageQueue};

/// Default delay between the last mutation and the cart write.
pub const DEFAULT_PERSIST_DEBOUNCE: Duration = Duration::from_millis(250);

/// Store tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Delay before a scheduled write runs. Further mutations within the
    /// window fold into the same write. Zero writes on the next tick.
    pub persist_debounce: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            persist_debounce: DEFAULT_PERSIST_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoadStatus {
    generation: u64,
    phase: LoadPhase,
}

#[derive(Debug, Default)]
struct Session {
    cart: CartState,
    observed: bool,
    active_key: Option<SessionKey>,
    generation: u64,
    phase: LoadPhase,
    mutated_while_loading: bool,
    /// A write is scheduled but its snapshot has not been taken yet.
    dirty: bool,
    /// Bumped whenever a scheduled write is superseded or cancelled.
    write_seq: u64,
}

struct StoreInner {
    /// Runtime the store's tasks run on, so sync methods work from any thread.
    runtime: Handle,
    discounts: Arc<dyn DiscountService>,
    options: StoreOptions,
    queue: StorageQueue,
    session: Mutex<Session>,
    load_status: watch::Sender<LoadStatus>,
}

/// Cart store handle.
///
/// Cheap to clone; clones share the same cart. Construct one per application
/// root and pass it to the consumers that need it.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.lock();
        f.debug_struct("CartStore")
            .field("active_key", &session.active_key)
            .field("generation", &session.generation)
            .field("phase", &session.phase)
            .field("items", &session.cart.items.len())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store with no session.
    ///
    /// The store keeps a handle to the current Tokio runtime and runs its
    /// loads, debounced writes and storage worker there. Once built, its
    /// methods may be called from any thread.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(
        storage: Arc<dyn CartStorage>,
        discounts: Arc<dyn DiscountService>,
        options: StoreOptions,
    ) -> Self {
        let (load_status, _) = watch::channel(LoadStatus {
            generation: 0,
            phase: LoadPhase::Idle,
        });

        let runtime = Handle::current();
        let queue = StorageQueue::spawn(&runtime, storage);

        Self {
            inner: Arc::new(StoreInner {
                runtime,
                discounts,
                options,
                queue,
                session: Mutex::new(Session::default()),
                load_status,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &Session) {
        self.inner.load_status.send_replace(LoadStatus {
            generation: session.generation,
            phase: session.phase,
        });
    }

    // =========================================================================
    // Session tracking
    // =========================================================================

    /// Observe the current session identity.
    ///
    /// Cheap and idempotent: calling it again with an identity that resolves
    /// to the active key does nothing. On a key change the cart is cleared
    /// before this returns and the new key's stored cart loads in the
    /// background. An identity with no table, customer or ticket ends the
    /// session without loading anything.
    pub fn observe_session(&self, identity: &SessionIdentity) {
        let key = SessionKey::resolve(identity);
        let next = (!key.is_guest()).then_some(key);

        let mut session = self.lock();
        if session.observed && session.active_key == next {
            return;
        }

        self.flush_pending(&mut session);

        let previous = session.active_key.take();
        session.observed = true;
        session.cart = CartState::default();
        session.generation += 1;
        session.write_seq += 1;
        session.mutated_while_loading = false;
        session.active_key.clone_from(&next);
        session.phase = if next.is_some() {
            LoadPhase::Loading
        } else {
            LoadPhase::Idle
        };
        self.publish(&session);

        let generation = session.generation;
        drop(session);

        info!(
            from = previous.as_ref().map(SessionKey::as_str),
            to = next.as_ref().map(SessionKey::as_str),
            generation,
            "Cart session changed"
        );

        if let Some(key) = next {
            let store = self.clone();
            self.inner
                .runtime
                .spawn(async move { store.load(key, generation).await });
        }
    }

    async fn load(&self, key: SessionKey, generation: u64) {
        // Let the cleared cart be seen before the storage round trip.
        tokio::task::yield_now().await;

        if self.generation() != generation {
            debug!(key = %key, generation, "Skipping load for superseded session");
            return;
        }

        let loaded = match self.inner.queue.read(key.clone()).await {
            Ok(Some(raw)) => blob::decode(&raw).unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "Stored cart is unreadable; starting empty");
                CartState::default()
            }),
            Ok(None) => CartState::default(),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read stored cart; starting empty");
                CartState::default()
            }
        };

        let mut session = self.lock();
        if session.generation != generation {
            debug!(key = %key, generation, "Discarding stale cart load");
            return;
        }
        if session.mutated_while_loading {
            warn!(
                key = %key,
                generation,
                "Cart changed before its stored state finished loading; stored state replaces it"
            );
        }

        session.cart = loaded;
        session.phase = LoadPhase::Loaded;
        session.mutated_while_loading = false;
        self.publish(&session);

        debug!(
            key = %key,
            generation,
            items = session.cart.items.len(),
            "Cart loaded"
        );
    }

    /// Wait until the active session's stored cart has been applied.
    ///
    /// Returns immediately when nothing is loading.
    pub async fn wait_loaded(&self) {
        let mut rx = self.inner.load_status.subscribe();
        let _ = rx.wait_for(|status| status.phase != LoadPhase::Loading).await;
    }

    /// Storage key of the active session, if any.
    #[must_use]
    pub fn active_key(&self) -> Option<SessionKey> {
        self.lock().active_key.clone()
    }

    /// Load phase of the active session.
    #[must_use]
    pub fn load_phase(&self) -> LoadPhase {
        self.lock().phase
    }

    /// Number of session changes observed so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    // =========================================================================
    // Cart operations
    // =========================================================================

    /// Apply `change` to the cart and schedule a write if it reports a change.
    fn mutate<R>(&self, change: impl FnOnce(&mut CartState) -> (bool, R)) -> R {
        let mut session = self.lock();
        let (changed, result) = change(&mut session.cart);

        if changed {
            if session.phase == LoadPhase::Loading {
                session.mutated_while_loading = true;
            }
            self.schedule_persist(&mut session);
        }
        result
    }

    /// Add `qty` units of `item`.
    ///
    /// Merges into an existing line with the same catalog id, add-on set and
    /// special instructions; that line keeps the unit price it was created
    /// with. Otherwise appends a new line priced at
    /// `options.total_item_price`, or base price plus add-ons.
    ///
    /// Adding zero units changes nothing and returns `false`.
    pub fn add_item(&self, item: &MenuItem, options: AddItemOptions) -> bool {
        if options.qty == 0 {
            debug!(item = %item.id, "Ignoring add of zero units");
            return false;
        }

        let signature = LineSignature::new(
            &item.id,
            &options.add_ons,
            &options.special_instructions,
        );

        self.mutate(|cart| {
            if let Some(line) = cart
                .items
                .iter_mut()
                .find(|line| line.signature() == signature)
            {
                line.qty = line.qty.saturating_add(options.qty);
            } else {
                let total_item_price = options
                    .total_item_price
                    .unwrap_or_else(|| calculate_total_price(item.base_price, &options.add_ons));

                cart.items.push(LineItem {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    base_price: item.base_price,
                    qty: options.qty,
                    add_ons: options.add_ons,
                    special_instructions: options.special_instructions,
                    total_item_price: Some(total_item_price),
                });
            }
            (true, true)
        })
    }

    /// Remove every line with catalog id `id`, whatever its add-ons or
    /// instructions. Returns the number of lines removed.
    pub fn remove_item(&self, id: &ItemId) -> usize {
        self.mutate(|cart| {
            let before = cart.items.len();
            cart.items.retain(|line| &line.id != id);
            let removed = before - cart.items.len();
            (removed > 0, removed)
        })
    }

    /// Set the quantity of the first line with catalog id `id`.
    ///
    /// A quantity of zero keeps the line; removing it is up to the caller.
    /// Returns `false` if no line matches.
    pub fn update_qty(&self, id: &ItemId, qty: u32) -> bool {
        self.mutate(|cart| match cart.items.iter_mut().find(|line| &line.id == id) {
            Some(line) => {
                let changed = line.qty != qty;
                line.qty = qty;
                (changed, true)
            }
            None => (false, false),
        })
    }

    /// Empty the cart and delete the active session's stored cart.
    ///
    /// The in-memory reset happens before the first `.await`; the returned
    /// future completes once the stored cart is gone.
    pub async fn clear(&self) {
        let done = {
            let mut session = self.lock();
            session.cart = CartState::default();
            session.dirty = false;
            session.write_seq += 1;
            if session.phase == LoadPhase::Loading {
                session.mutated_while_loading = true;
            }

            let Some(key) = session.active_key.clone() else {
                return;
            };
            info!(key = %key, "Clearing cart");

            let (done, rx) = oneshot::channel();
            self.inner.queue.push(StorageOp::Remove {
                key,
                done: Some(done),
            });
            rx
        };
        let _ = done.await;
    }

    // =========================================================================
    // Discounts
    // =========================================================================

    /// Look `code` up and make it the cart's discount.
    ///
    /// Unknown codes and lookup failures clear any existing discount and
    /// return [`DiscountOutcome::Rejected`] with a displayable reason. If the
    /// session changes while the lookup is in flight, the result is not
    /// applied to the new session's cart.
    pub async fn apply_discount_code(&self, code: &str) -> DiscountOutcome {
        let code = code.trim();
        if code.is_empty() {
            self.set_discount(None, String::new());
            return DiscountOutcome::Rejected {
                reason: "Please enter a discount code".to_string(),
            };
        }

        let generation = self.generation();
        let lookup = self.inner.discounts.lookup(code).await;

        if self.generation() != generation {
            debug!(code, "Session changed during discount lookup; ignoring result");
            return DiscountOutcome::Rejected {
                reason: "Your order changed while the code was being checked".to_string(),
            };
        }

        match lookup {
            Ok(Some(record)) => {
                info!(code, "Discount applied");
                self.set_discount(Some(record.clone()), code.to_uppercase());
                DiscountOutcome::Applied(record)
            }
            Ok(None) => {
                debug!(code, "Discount code not found");
                self.set_discount(None, String::new());
                DiscountOutcome::Rejected {
                    reason: "Invalid discount code".to_string(),
                }
            }
            Err(e) => {
                warn!(code, error = %e, "Discount lookup failed");
                self.set_discount(None, String::new());
                DiscountOutcome::Rejected {
                    reason: "Failed to apply discount code".to_string(),
                }
            }
        }
    }

    /// Drop the discount, keeping the items.
    pub fn remove_discount(&self) {
        self.set_discount(None, String::new());
    }

    fn set_discount(&self, discount: Option<DiscountRecord>, code: String) {
        self.mutate(|cart| {
            let changed = cart.discount != discount || cart.discount_code != code;
            cart.discount = discount;
            cart.discount_code = code;
            (changed, ())
        });
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the whole cart.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.lock().cart.clone()
    }

    /// Snapshot of the cart lines.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.lock().cart.items.clone()
    }

    /// The active discount record.
    #[must_use]
    pub fn discount(&self) -> Option<DiscountRecord> {
        self.lock().cart.discount.clone()
    }

    /// The active discount code, empty when none.
    #[must_use]
    pub fn discount_code(&self) -> String {
        self.lock().cart.discount_code.clone()
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lock().cart.item_count()
    }

    /// Subtotal, discount and final total, computed from the current cart.
    ///
    /// Without a discount, or with a non-positive subtotal, the final total is
    /// the subtotal. Otherwise the discount service's figures are used as-is.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        let (subtotal, discount) = {
            let session = self.lock();
            (session.cart.subtotal(), session.cart.discount.clone())
        };

        let effect = match discount {
            Some(discount) if subtotal > Decimal::ZERO => {
                self.inner.discounts.apply(&discount, subtotal)
            }
            _ => DiscountEffect::none(subtotal),
        };

        CartTotals {
            subtotal,
            discount_amount: effect.discount_amount,
            final_total: effect.final_total,
        }
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.totals().subtotal
    }

    #[must_use]
    pub fn discount_amount(&self) -> Decimal {
        self.totals().discount_amount
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.totals().final_total
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn schedule_persist(&self, session: &mut Session) {
        let Some(key) = session.active_key.clone() else {
            return;
        };
        if session.phase == LoadPhase::Loading {
            debug!(key = %key, "Cart write suppressed while loading");
            return;
        }

        session.dirty = true;
        session.write_seq += 1;
        let seq = session.write_seq;
        let debounce = self.inner.options.persist_debounce;
        let store = self.clone();

        self.inner.runtime.spawn(async move {
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
            }
            store.write_scheduled(seq);
        });
    }

    fn write_scheduled(&self, seq: u64) {
        let mut session = self.lock();
        if session.write_seq != seq || !session.dirty {
            return;
        }
        self.flush_pending(&mut session);
    }

    /// Enqueue a write of the current cart if one is pending.
    fn flush_pending(&self, session: &mut Session) {
        if !session.dirty {
            return;
        }
        session.dirty = false;

        if let Some(key) = session.active_key.clone() {
            self.enqueue_write(key, &session.cart, None);
        }
    }

    fn enqueue_write(&self, key: SessionKey, cart: &CartState, done: Option<oneshot::Sender<()>>) {
        match PersistedCart::from_state(cart).encode() {
            Ok(blob) => self.inner.queue.push(StorageOp::Write { key, blob, done }),
            Err(e) => warn!(key = %key, error = %e, "Failed to serialize cart"),
        }
    }

    /// Write the current cart now, replacing any debounced write.
    ///
    /// Does nothing without a session or while the stored cart is loading.
    pub async fn flush(&self) {
        let done = {
            let mut session = self.lock();
            let Some(key) = session.active_key.clone() else {
                return;
            };
            if session.phase == LoadPhase::Loading {
                return;
            }

            session.dirty = false;
            session.write_seq += 1;
            let (done, rx) = oneshot::channel();
            self.enqueue_write(key, &session.cart, Some(done));
            rx
        };
        let _ = done.await;
    }
}
