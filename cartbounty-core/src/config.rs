//! Configuration constants and defaults.
//!
//! The defaults reproduce the behaviour of the original plugin: carts are
//! transferred in batches of 100, the list view shows 10 carts per page and a
//! cart counts as "still shopping" for an hour.

use std::time::Duration;

use crate::error::ConfigError;

/// Number of carts written by a single INSERT statement during the transfer.
///
/// Keeps each generated statement well below the statement size and bound
/// parameter limits of the supported databases.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Carts shown per page when no valid page size is requested.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// How long after its last update a cart is still considered in progress.
pub const DEFAULT_WAITING_TIME: Duration = Duration::from_secs(60 * 60);

/// How long after its last update a cart is flagged as new.
pub const DEFAULT_NEW_NOTICE: Duration = Duration::from_secs(240 * 60);

/// How reused cart ids are handled while writing a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// A reused id fails the whole batch.
    #[default]
    Fail,
    /// A reused id keeps the existing cart and the rest of the batch is written.
    Skip,
}

/// Settings of the legacy cart transfer.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Maximum number of carts per INSERT statement.
    pub batch_size: usize,

    /// Handling of cart ids already present in the cart table.
    pub conflict: ConflictPolicy,

    /// Write every batch inside a single transaction.
    ///
    /// When disabled, batches written before a failure stay committed.
    pub atomic: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            conflict: ConflictPolicy::Fail,
            atomic: false,
        }
    }
}

/// Settings of the cart list view.
#[derive(Debug, Clone)]
pub struct ListConfig {
    /// Page size used when the requested one is missing or invalid.
    pub per_page: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Time windows used to classify carts.
#[derive(Debug, Clone)]
pub struct StatusConfig {
    pub waiting_time: Duration,
    pub new_notice: Duration,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            waiting_time: DEFAULT_WAITING_TIME,
            new_notice: DEFAULT_NEW_NOTICE,
        }
    }
}

/// Top level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub transfer: TransferConfig,
    pub list: ListConfig,
    pub status: StatusConfig,

    /// Version of the running plugin, compared against the stored one on
    /// activation.
    pub version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transfer: TransferConfig::default(),
            list: ListConfig::default(),
            status: StatusConfig::default(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl Config {
    /// Set custom transfer settings.
    pub fn with_transfer(mut self, transfer: TransferConfig) -> Self {
        self.transfer = transfer;
        self
    }

    /// Set custom list settings.
    pub fn with_list(mut self, list: ListConfig) -> Self {
        self.list = list;
        self
    }

    /// Set custom status windows.
    pub fn with_status(mut self, status: StatusConfig) -> Self {
        self.status = status;
        self
    }

    /// Set the running plugin version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transfer.validate()?;

        if self.list.per_page == 0 {
            return Err(ConfigError::ZeroPerPage);
        }

        Ok(())
    }
}

impl TransferConfig {
    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the conflict policy.
    pub fn with_conflict(mut self, conflict: ConflictPolicy) -> Self {
        self.conflict = conflict;
        self
    }

    /// Enable or disable the single transaction mode.
    pub fn with_atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.transfer.batch_size, 100);
        assert_eq!(config.transfer.conflict, ConflictPolicy::Fail);
        assert!(!config.transfer.atomic);
        assert_eq!(config.list.per_page, 10);
        assert_eq!(config.status.waiting_time, Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let config =
            Config::default().with_transfer(TransferConfig::default().with_batch_size(0));
        assert_eq!(config.validate(), Err(ConfigError::ZeroBatchSize));

        let config = Config::default().with_list(ListConfig { per_page: 0 });
        assert_eq!(config.validate(), Err(ConfigError::ZeroPerPage));
    }
}
