//! SQL schema migrations for CartBounty storage.
//!
//! # Features
//!
//! - **`sqlite`** - Enables SQLite database support
//! - **`mysql`** - Enables MySQL database support
//! - **`postgres`** - Enables PostgreSQL database support
//!
//! # Usage
//!
//! Run the migrator before activating the plugin, the transfer writes into the
//! tables it creates.
//!
//! ```rust,ignore
//! use sqlx_migrator::{Migrate, Plan};
//!
//! let mut conn = pool.acquire().await?;
//! let migrator = cartbounty_sql_migrator::new::<sqlx::Sqlite>()?;
//!
//! migrator.run(&mut *conn, &Plan::apply_all()).await?;
//! ```
//!
//! # Database Schema
//!
//! | Table | Content |
//! |-------|---------|
//! | `cartbounty` | Captured carts |
//! | `cartbounty_options` | Plugin options (`option_name`, `option_value`) |
//!
//! The legacy `captured_wc_fields` table is never created, only read and
//! dropped by the transfer.

use sqlx_migrator::{Info, Migrator};

mod m0001;

pub use m0001::InitMigration;

/// Creates a new [`Migrator`] instance with all CartBounty migrations registered.
///
/// # Errors
///
/// Returns an error if migration registration fails.
pub fn new<DB: sqlx::Database>() -> Result<Migrator<DB>, sqlx_migrator::Error>
where
    InitMigration: sqlx_migrator::Migration<DB>,
{
    let mut migrator = Migrator::default();
    migrator.add_migration(Box::new(InitMigration))?;

    Ok(migrator)
}
