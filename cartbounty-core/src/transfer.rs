//! One-time transfer of carts from the legacy `captured_wc_fields` table.
//!
//! The transfer reads every legacy cart with contents, writes them into the
//! cart table in fixed-size batches, persists the [`TRANSFERRED_OPTION`] flag
//! and finally drops the legacy table.
//!
//! The flag is read before the legacy table and written after the last batch.
//! Both steps are separate statements, two activations racing on the same
//! installation may both transfer.
//!
//! # Example
//!
//! ```rust,ignore
//! let outcome = transfer(&executor, &TransferConfig::default()).await?;
//!
//! if let TransferOutcome::Completed(report) = outcome {
//!     println!("imported {} carts", report.imported);
//! }
//! ```

use std::num::NonZeroUsize;

use crate::{
    batch::{batch_count, batches},
    cart::NewCart,
    config::TransferConfig,
    error::{ConfigError, TransferError},
    executor::{Executor, Options},
};

/// Option set to `"1"` once the legacy carts have been transferred.
pub const TRANSFERRED_OPTION: &str = "cartbounty_transferred_table";

/// Why a transfer did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fresh installations never had the legacy table.
    LegacyTableMissing,
    AlreadyTransferred,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// Legacy carts with contents.
    pub read: usize,
    pub batches: usize,
    /// Rows reported as inserted by the executor.
    pub imported: u64,
    /// False when the legacy table could not be dropped.
    pub legacy_dropped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Skipped(SkipReason),
    Completed(TransferReport),
}

impl TransferOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn report(&self) -> Option<&TransferReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped(_) => None,
        }
    }
}

/// Transfers the legacy carts unless it already happened.
///
/// Any error leaves the flag unset, except [`TransferError::Flag`]. Batches
/// written before a failure stay in the cart table unless
/// [`TransferConfig::atomic`] is enabled.
pub async fn transfer<E: Executor + ?Sized>(
    executor: &E,
    config: &TransferConfig,
) -> Result<TransferOutcome, TransferError> {
    config.validate()?;
    let size = NonZeroUsize::new(config.batch_size).ok_or(ConfigError::ZeroBatchSize)?;

    if !executor
        .legacy_table_exists()
        .await
        .map_err(TransferError::Probe)?
    {
        tracing::debug!("legacy cart table not found, nothing to transfer");
        return Ok(TransferOutcome::Skipped(SkipReason::LegacyTableMissing));
    }

    let options = Options::new(executor);

    if options
        .is_enabled(TRANSFERRED_OPTION)
        .await
        .map_err(TransferError::Probe)?
    {
        tracing::debug!("legacy carts already transferred");
        return Ok(TransferOutcome::Skipped(SkipReason::AlreadyTransferred));
    }

    let legacy = executor
        .read_legacy_carts()
        .await
        .map_err(TransferError::Read)?;

    let carts = legacy.iter().map(NewCart::from).collect::<Vec<_>>();
    let total = batch_count(carts.len(), size);

    tracing::info!(
        read = carts.len(),
        batches = total,
        atomic = config.atomic,
        "transferring legacy carts"
    );

    let imported = if config.atomic {
        let chunks = batches(&carts, size).collect::<Vec<_>>();

        executor
            .insert_carts_atomic(&chunks, config.conflict)
            .await
            .map_err(|source| TransferError::Atomic { total, source })?
    } else {
        let mut imported = 0;

        for (index, chunk) in batches(&carts, size).enumerate() {
            let batch = index + 1;
            let rows = executor
                .insert_carts(chunk, config.conflict)
                .await
                .map_err(|source| TransferError::Write {
                    batch,
                    total,
                    source,
                })?;

            tracing::debug!(batch, total, rows, "legacy cart batch written");
            imported += rows;
        }

        imported
    };

    executor
        .update_option(TRANSFERRED_OPTION, "1")
        .await
        .map_err(TransferError::Flag)?;

    let legacy_dropped = match executor.drop_legacy_table().await {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(error = %err, "failed to drop legacy cart table");
            false
        }
    };

    tracing::info!(imported, legacy_dropped, "legacy carts transferred");

    Ok(TransferOutcome::Completed(TransferReport {
        read: carts.len(),
        batches: total,
        imported,
        legacy_dropped,
    }))
}
