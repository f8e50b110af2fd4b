//! Tableside Core - Shared types library.
//!
//! This crate provides the types shared by all Tableside components:
//! - `cart` - Session-scoped cart store, persistence and discount contracts
//! - `cli` - Command-line front-end over a file-backed cart store
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no async
//! runtime, no storage. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Catalog IDs, prices, line items, session identity and storage keys

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
