//! SQL storage for CartBounty carts and options.
//!
//! This crate implements the [`Executor`](cartbounty_core::Executor) trait on top of
//! SQLx, supporting SQLite, MySQL, and PostgreSQL through feature flags.
//!
//! # Features
//!
//! - **`sqlite`** - Enables SQLite database support
//! - **`mysql`** - Enables MySQL database support
//! - **`postgres`** - Enables PostgreSQL database support
//!
//! All features are enabled by default. You can selectively enable only the databases you need:
//!
//! ```toml
//! [dependencies]
//! cartbounty-sql = { version = "0.1", default-features = false, features = ["mysql"] }
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use cartbounty_sql::Sql;
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! let pool = SqlitePoolOptions::new()
//!     .connect(":memory:")
//!     .await?;
//!
//! let executor: Sql<sqlx::Sqlite> = pool.into();
//! let outcome = cartbounty_core::transfer(&executor, &Default::default()).await?;
//! ```
//!
//! ## Type Aliases
//!
//! - [`Sqlite`] - `Sql<sqlx::Sqlite>`
//! - [`MySql`] - `Sql<sqlx::MySql>`
//! - [`Postgres`] - `Sql<sqlx::Postgres>`
//!
//! # Core Components
//!
//! - [`Sql`] - The executor type wrapping a SQLx connection pool
//! - [`RowsAffected`] - Affected row count of a backend query result
//! - [`Cart`], [`LegacyCart`], [`CartOption`] - Sea-Query column identifiers

mod sql;

pub use sql::*;
