//! Core types and routines for CartBounty cart storage.
//!
//! This crate holds everything that does not depend on a particular database:
//! cart records, sanitizers, the [`Executor`] trait storage backends implement,
//! and the routines built on top of it.
//!
//! # Features
//!
//! - **`memory`** (default) - In-memory executor via [`Memory`]
//! - **`sqlite`**, **`mysql`**, **`postgres`** - Row decoding via sqlx
//!
//! # Core Concepts
//!
//! ## Legacy transfer
//!
//! Old installations captured carts into the `captured_wc_fields` table.
//! [`transfer`] moves them into the current `cartbounty` table once, in
//! batches, and records the fact in the `cartbounty_transferred_table` option:
//!
//! ```rust,ignore
//! let outcome = cartbounty_core::transfer(&executor, &TransferConfig::default()).await?;
//! ```
//!
//! ## Activation
//!
//! [`activate`] runs the transfer followed by the option upgrades older
//! releases need.
//!
//! ## Listing
//!
//! [`list_carts`] and [`delete_carts`] back the abandoned cart list view. Use
//! [`CartQuery::from_request`] to turn raw request parameters into a query.
//!
//! # Modules
//!
//! - [`contents`] - Line items of a cart
//! - [`location`] - Location column encodings
//! - [`sanitize`] - Text, e-mail and amount sanitizers
//! - [`serialized`] - PHP-serialized blobs written by older releases
//! - [`status`] - Status labels of the list view

mod activation;
mod batch;
mod cart;
mod config;
pub mod contents;
mod error;
mod executor;
mod listing;
pub mod location;
#[cfg(feature = "memory")]
mod memory;
pub mod sanitize;
pub mod serialized;
pub mod status;
mod transfer;

pub use activation::*;
pub use batch::*;
pub use cart::*;
pub use config::*;
pub use error::*;
pub use executor::*;
pub use listing::*;
#[cfg(feature = "memory")]
pub use memory::*;
pub use transfer::*;
