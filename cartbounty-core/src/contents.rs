//! Line items stored in the `cart_contents` column.
//!
//! The column holds a PHP-serialized or JSON list of items, see
//! [`crate::serialized`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::serialized::decode_blob;

/// One product line of a captured cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(default, deserialize_with = "int")]
    pub product_id: i64,
    #[serde(default, deserialize_with = "optional_int")]
    pub product_variation_id: Option<i64>,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default, deserialize_with = "int")]
    pub quantity: i64,
}

// Ids and quantities are stored as numbers or numeric strings.
fn optional_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|number| number as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(optional_int(deserializer)?.unwrap_or_default())
}

impl CartItem {
    /// Product title followed by the quantity in brackets, e.g. `Mug (2)`.
    pub fn summary(&self) -> String {
        format!(
            "{} ({})",
            self.product_title.as_deref().unwrap_or_default(),
            self.quantity
        )
    }
}

/// Decodes the line items of a cart.
///
/// Anything that is not a list or map of items decodes to no items. Items
/// without a title are skipped, as the list view has nothing to show for them.
pub fn decode_cart_contents(contents: &str) -> Vec<CartItem> {
    let items = match decode_blob(contents) {
        Some(Value::Array(items)) => items,
        Some(Value::Object(items)) => items.into_iter().map(|(_, item)| item).collect(),
        _ => return vec![],
    };

    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<CartItem>(item).ok())
        .filter(|item| item.product_title.is_some())
        .collect()
}
