//! Ordered storage queue.
//!
//! Every storage call made by a [`super::CartStore`] goes through one worker
//! task, so operations reach the backend in the order they were issued. A
//! write for the cart being switched away from therefore always lands before
//! any later read of the same key.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use tableside_core::SessionKey;

use crate::storage::{CartStorage, StorageError};

pub(super) enum StorageOp {
    Read {
        key: SessionKey,
        reply: oneshot::Sender<Result<Option<String>, StorageError>>,
    },
    Write {
        key: SessionKey,
        blob: String,
        done: Option<oneshot::Sender<()>>,
    },
    Remove {
        key: SessionKey,
        done: Option<oneshot::Sender<()>>,
    },
}

/// Handle for enqueueing storage operations.
#[derive(Clone)]
pub(super) struct StorageQueue {
    tx: mpsc::UnboundedSender<StorageOp>,
}

impl StorageQueue {
    /// Spawn the worker on `runtime`.
    pub(super) fn spawn(runtime: &Handle, storage: Arc<dyn CartStorage>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run(storage, rx));
        Self { tx }
    }

    pub(super) fn push(&self, op: StorageOp) {
        if self.tx.send(op).is_err() {
            warn!("Cart storage worker has stopped; dropping operation");
        }
    }

    /// Read `key`. A stopped worker reads as an empty slot.
    pub(super) async fn read(&self, key: SessionKey) -> Result<Option<String>, StorageError> {
        let (reply, rx) = oneshot::channel();
        self.push(StorageOp::Read { key, reply });
        rx.await.unwrap_or(Ok(None))
    }
}

async fn run(storage: Arc<dyn CartStorage>, mut rx: mpsc::UnboundedReceiver<StorageOp>) {
    while let Some(op) = rx.recv().await {
        match op {
            StorageOp::Read { key, reply } => {
                let result = storage.get(key.as_str()).await;
                // The loader may have been dropped with its task.
                let _ = reply.send(result);
            }
            StorageOp::Write { key, blob, done } => {
                match storage.set(key.as_str(), blob).await {
                    Ok(()) => debug!(key = %key, "Cart persisted"),
                    Err(e) => warn!(key = %key, error = %e, "Failed to persist cart"),
                }
                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
            StorageOp::Remove { key, done } => {
                match storage.remove(key.as_str()).await {
                    Ok(()) => debug!(key = %key, "Stored cart removed"),
                    Err(e) => warn!(key = %key, error = %e, "Failed to remove stored cart"),
                }
                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
        }
    }
    debug!("Cart storage worker stopped");
}
