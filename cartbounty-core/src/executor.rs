//! Storage abstraction.
//!
//! This module defines the [`Executor`] trait, implemented by every storage
//! backend. The transfer, activation and listing routines only talk to storage
//! through it.
//!
//! # Types
//!
//! - [`Executor`] - Core trait for storage backends
//! - [`Options`] - Typed helpers over the option store of an executor

use crate::{
    cart::{Cart, LegacyCart, NewCart},
    config::ConflictPolicy,
    error::WriteError,
    listing::{CartFilter, CartQuery},
};

/// Core trait for storage backends.
///
/// The main implementation is [`cartbounty_sql::Sql`](../cartbounty_sql/struct.Sql.html),
/// an in-memory one is available behind the `memory` feature.
///
/// # Methods
///
/// - `legacy_table_exists` / `read_legacy_carts` / `drop_legacy_table` - Legacy table access
/// - `insert_carts` / `insert_carts_atomic` - Batched writes into the cart table
/// - `get_option` / `update_option` / `add_option` / `delete_option` - Key-value option store
/// - `read_carts` / `count_carts` / `delete_carts` - Cart list view
#[async_trait::async_trait]
pub trait Executor: Send + Sync + 'static {
    /// Returns true while the legacy `captured_wc_fields` table exists.
    async fn legacy_table_exists(&self) -> anyhow::Result<bool>;

    /// Reads every legacy cart with non-empty contents.
    async fn read_legacy_carts(&self) -> anyhow::Result<Vec<LegacyCart>>;

    /// Drops the legacy table if it still exists.
    async fn drop_legacy_table(&self) -> anyhow::Result<()>;

    /// Inserts one batch with a single statement, returning the affected row count.
    async fn insert_carts(
        &self,
        carts: &[NewCart],
        conflict: ConflictPolicy,
    ) -> Result<u64, WriteError>;

    /// Inserts every batch inside one transaction.
    ///
    /// Either all batches are written or none is.
    async fn insert_carts_atomic(
        &self,
        batches: &[&[NewCart]],
        conflict: ConflictPolicy,
    ) -> Result<u64, WriteError>;

    async fn get_option(&self, name: &str) -> anyhow::Result<Option<String>>;

    /// Creates or replaces an option.
    async fn update_option(&self, name: &str, value: &str) -> anyhow::Result<()>;

    /// Creates an option unless it already exists.
    ///
    /// Returns false when the option was already present, its value is left
    /// untouched.
    async fn add_option(&self, name: &str, value: &str) -> anyhow::Result<bool>;

    async fn delete_option(&self, name: &str) -> anyhow::Result<()>;

    /// Reads one page of listed carts.
    async fn read_carts(&self, query: &CartQuery) -> anyhow::Result<Vec<Cart>>;

    /// Counts the carts selected by a filter.
    async fn count_carts(&self, filter: CartFilter) -> anyhow::Result<u64>;

    /// Deletes carts by id, returning the number of deleted rows.
    async fn delete_carts(&self, ids: &[i64]) -> anyhow::Result<u64>;
}

/// Returns true for option values that mean "enabled".
///
/// Missing options, empty strings and `"0"` are false.
pub fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some(value) if !value.is_empty() && value != "0")
}

/// Typed access to the option store of an executor.
pub struct Options<'a, E: ?Sized>(&'a E);

impl<'a, E: Executor + ?Sized> Options<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self(executor)
    }

    pub async fn get(&self, name: &str) -> anyhow::Result<Option<String>> {
        self.0.get_option(name).await
    }

    pub async fn is_enabled(&self, name: &str) -> anyhow::Result<bool> {
        Ok(is_truthy(self.0.get_option(name).await?.as_deref()))
    }

    pub async fn enable(&self, name: &str) -> anyhow::Result<()> {
        self.0.update_option(name, "1").await
    }

    pub async fn update_json<T: serde::Serialize + Sync>(
        &self,
        name: &str,
        value: &T,
    ) -> anyhow::Result<()> {
        let value = serde_json::to_string(value)?;

        self.0.update_option(name, &value).await
    }

    /// Moves a truthy option to a new name, deleting the old one.
    ///
    /// Returns true when the option was moved.
    pub async fn rename(&self, from: &str, to: &str) -> anyhow::Result<bool> {
        let Some(value) = self.0.get_option(from).await? else {
            return Ok(false);
        };

        if !is_truthy(Some(&value)) {
            return Ok(false);
        }

        self.0.update_option(to, &value).await?;
        self.0.delete_option(from).await?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(Some("1")));
        assert!(is_truthy(Some("yes")));
        assert!(!is_truthy(Some("0")));
        assert!(!is_truthy(Some("")));
        assert!(!is_truthy(None));
    }
}
