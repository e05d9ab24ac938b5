//! Abandoned cart storage for CartBounty.
//!
//! This crate re-exports [`cartbounty_core`] along with the SQL executor and
//! its schema migrator.
//!
//! # Features
//!
//! - **`memory`** (default) - In-memory executor via [`Memory`]
//! - **`sqlite`** (default), **`mysql`**, **`postgres`** - SQL executor and migrator
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlx_migrator::{Migrate, Plan};
//!
//! let mut conn = pool.acquire().await?;
//! cartbounty::sql_migrator::new::<sqlx::Sqlite>()?
//!     .run(&mut *conn, &Plan::apply_all())
//!     .await?;
//!
//! let executor = cartbounty::Sqlite::from(pool);
//! let report = cartbounty::activate(&executor, &cartbounty::Config::default()).await?;
//! ```

pub use cartbounty_core::*;

#[cfg(any(feature = "sqlite", feature = "mysql", feature = "postgres"))]
pub mod sql {
    pub use cartbounty_sql::*;
}

#[cfg(any(feature = "sqlite", feature = "mysql", feature = "postgres"))]
pub mod sql_migrator {
    pub use cartbounty_sql_migrator::*;
}

#[cfg(feature = "mysql")]
pub use cartbounty_sql::MySql;
#[cfg(feature = "postgres")]
pub use cartbounty_sql::Postgres;
#[cfg(feature = "sqlite")]
pub use cartbounty_sql::Sqlite;
