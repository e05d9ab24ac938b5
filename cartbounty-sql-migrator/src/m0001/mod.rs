//! Initial database schema migration.

mod cart;
mod option;

use sqlx_migrator::vec_box;

/// Creates the cart and option tables.
///
/// ## Cart Table
///
/// `cartbounty`, one row per captured cart:
/// - `id` - Auto-increment primary key
/// - `name`, `surname` (VARCHAR(60)), `email` (VARCHAR(100)), `phone` (VARCHAR(20))
/// - `location` (VARCHAR(100)), `cart_contents` and `other_fields` (TEXT)
/// - `cart_total` - DECIMAL(10,2), `currency` - VARCHAR(10)
/// - `time` - Nullable DATETIME, `session_id` - VARCHAR(60)
/// - `mail_sent`, `wp_unsubscribed`, `wp_steps_completed`, `wp_complete`, `type` - Integers defaulting to 0
///
/// ## Option Table
///
/// `cartbounty_options`, plugin settings and run-once flags:
/// - `option_name` - VARCHAR(191) primary key
/// - `option_value` - TEXT
pub struct InitMigration;

#[cfg(feature = "sqlite")]
sqlx_migrator::sqlite_migration!(
    InitMigration,
    "cartbounty",
    "init_migration",
    vec_box![],
    vec_box![cart::create_table::Operation, option::create_table::Operation]
);

#[cfg(feature = "mysql")]
sqlx_migrator::mysql_migration!(
    InitMigration,
    "cartbounty",
    "init_migration",
    vec_box![],
    vec_box![cart::create_table::Operation, option::create_table::Operation]
);

#[cfg(feature = "postgres")]
sqlx_migrator::postgres_migration!(
    InitMigration,
    "cartbounty",
    "init_migration",
    vec_box![],
    vec_box![cart::create_table::Operation, option::create_table::Operation]
);
