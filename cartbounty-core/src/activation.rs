//! Plugin activation: legacy cart transfer followed by option upgrades.

use serde_json::Value;

use crate::{
    config::Config,
    error::{ActivationError, TransferError},
    executor::{Executor, Options},
    transfer::{transfer, TransferOutcome},
};

pub const EXIT_INTENT_TYPE_OPTION: &str = "cartbounty_exit_intent_type";
pub const VERSION_NUMBER_OPTION: &str = "cartbounty_version_number";
pub const INTERVALS_CONVERTED_OPTION: &str = "cartbounty_converted_minutes_to_miliseconds";
pub const AUTOMATION_STEPS_OPTION: &str = "cartbounty_automation_steps";
pub const NOTIFICATION_FREQUENCY_OPTION: &str = "cartbounty_notification_frequency";

/// Options moved to a new name by older releases.
pub const RENAMED_OPTIONS: [(&str, &str); 2] = [
    (
        "cartbounty_captured_abandoned_cart_count",
        "cartbounty_recoverable_cart_count",
    ),
    (
        "cartbounty_automation_sent_emails",
        "cartbounty_automation_sends",
    ),
];

const MILLISECONDS_PER_MINUTE: i64 = 60_000;

/// One change applied by [`activate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upgrade {
    ExitIntentTypeAdded,
    OptionRenamed {
        from: &'static str,
        to: &'static str,
    },
    /// Fresh installs and reactivations only record that intervals are
    /// already in milliseconds.
    IntervalsMarkedConverted,
    IntervalsConverted {
        steps: usize,
        notification: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub transfer: TransferOutcome,
    pub upgrades: Vec<Upgrade>,
}

/// Runs every activation step in order.
///
/// A failed transfer aborts activation before any option is touched.
pub async fn activate<E: Executor + ?Sized>(
    executor: &E,
    config: &Config,
) -> Result<ActivationReport, ActivationError> {
    config.validate().map_err(TransferError::from)?;

    let transfer = transfer(executor, &config.transfer).await?;
    let options = Options::new(executor);
    let mut upgrades = vec![];

    if executor.add_option(EXIT_INTENT_TYPE_OPTION, "1").await? {
        upgrades.push(Upgrade::ExitIntentTypeAdded);
    }

    for (from, to) in RENAMED_OPTIONS {
        if options.rename(from, to).await? {
            tracing::info!(from, to, "option renamed");
            upgrades.push(Upgrade::OptionRenamed { from, to });
        }
    }

    if let Some(upgrade) = convert_intervals(&options, &config.version).await? {
        tracing::info!(?upgrade, "option intervals upgraded");
        upgrades.push(upgrade);
    }

    Ok(ActivationReport { transfer, upgrades })
}

async fn convert_intervals<E: Executor + ?Sized>(
    options: &Options<'_, E>,
    version: &str,
) -> Result<Option<Upgrade>, ActivationError> {
    let stored = options.get(VERSION_NUMBER_OPTION).await?.unwrap_or_default();

    if stored.is_empty() || stored == version {
        options.enable(INTERVALS_CONVERTED_OPTION).await?;
        return Ok(Some(Upgrade::IntervalsMarkedConverted));
    }

    if options.is_enabled(INTERVALS_CONVERTED_OPTION).await? {
        return Ok(None);
    }

    let mut steps = 0;

    if let Some(Value::Array(mut items)) = read_json(options, AUTOMATION_STEPS_OPTION).await? {
        if !items.is_empty() {
            for item in items.iter_mut() {
                let Some(step) = item.as_object_mut() else {
                    continue;
                };

                if let Some(interval) = step
                    .get("interval")
                    .filter(|value| !value.is_null())
                    .map(minutes_to_milliseconds)
                {
                    step.insert("interval".to_owned(), interval);
                    steps += 1;
                }
            }

            options
                .update_json(AUTOMATION_STEPS_OPTION, &Value::Array(items))
                .await?;
        }
    }

    let mut notification = false;

    if let Some(Value::Object(mut frequency)) =
        read_json(options, NOTIFICATION_FREQUENCY_OPTION).await?
    {
        if let Some(interval) = frequency
            .get("hours")
            .filter(|value| !value.is_null())
            .map(minutes_to_milliseconds)
        {
            frequency.insert("interval".to_owned(), interval);
            options
                .update_json(NOTIFICATION_FREQUENCY_OPTION, &Value::Object(frequency))
                .await?;
            notification = true;
        }
    }

    options.enable(INTERVALS_CONVERTED_OPTION).await?;

    Ok(Some(Upgrade::IntervalsConverted {
        steps,
        notification,
    }))
}

async fn read_json<E: Executor + ?Sized>(
    options: &Options<'_, E>,
    name: &str,
) -> Result<Option<Value>, ActivationError> {
    match options.get(name).await? {
        Some(value) if !value.is_empty() => Ok(Some(serde_json::from_str(&value)?)),
        _ => Ok(None),
    }
}

// Stored numbers are either JSON numbers or numeric strings, anything else
// counts as zero. Whole results stay integers.
fn minutes_to_milliseconds(value: &Value) -> Value {
    let minutes = match value {
        Value::Number(number) => match number.as_i64() {
            Some(minutes) => return Value::from(minutes.saturating_mul(MILLISECONDS_PER_MINUTE)),
            None => number.as_f64().unwrap_or_default(),
        },
        Value::String(text) => match text.trim().parse::<i64>() {
            Ok(minutes) => return Value::from(minutes.saturating_mul(MILLISECONDS_PER_MINUTE)),
            Err(_) => text.trim().parse::<f64>().unwrap_or_default(),
        },
        _ => 0.0,
    };

    let milliseconds = (minutes * MILLISECONDS_PER_MINUTE as f64).round();

    if milliseconds.is_finite() {
        Value::from(milliseconds as i64)
    } else {
        Value::from(0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_minutes_to_milliseconds() {
        assert_eq!(minutes_to_milliseconds(&json!(5)), json!(300_000));
        assert_eq!(minutes_to_milliseconds(&json!("60")), json!(3_600_000));
        assert_eq!(minutes_to_milliseconds(&json!(1.5)), json!(90_000));
        assert_eq!(minutes_to_milliseconds(&json!("0.25")), json!(15_000));
        assert_eq!(minutes_to_milliseconds(&json!(null)), json!(0));
        assert_eq!(minutes_to_milliseconds(&json!("soon")), json!(0));
    }
}
