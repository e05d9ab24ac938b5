//! Cart records of the legacy and current schemas.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    location::Location,
    sanitize::{round_total, sanitize_email, sanitize_text_field},
};

const TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parses a stored cart time.
///
/// Returns `None` for empty values and for the `0000-00-00 00:00:00` zero date
/// MySQL uses as column default.
pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Lifecycle of a cart in the current schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CartType {
    /// Captured but not turned into an order.
    #[default]
    Abandoned,
    /// Turned into an order after recovery.
    Recovered,
    /// Excluded from the list view (incomplete capture).
    Excluded,
}

impl CartType {
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Abandoned => 0,
            Self::Recovered => 1,
            Self::Excluded => 2,
        }
    }
}

// The column is free text in old installations, unknown values are treated
// as abandoned carts.
impl From<i64> for CartType {
    fn from(value: i64) -> Self {
        match value {
            1 => Self::Recovered,
            2 => Self::Excluded,
            _ => Self::Abandoned,
        }
    }
}

/// One row of the legacy `captured_wc_fields` table, exactly as stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyCart {
    pub id: i64,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Free text `"country, city"`
    pub location: Option<String>,
    pub cart_contents: Option<String>,
    pub cart_total: Option<f64>,
    pub currency: Option<String>,
    pub time: Option<String>,
    pub session_id: Option<String>,
    pub mail_sent: i64,
    pub other_fields: Option<String>,
}

/// Sanitized values of a legacy cart, ready to be inserted into the cart table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCart {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub cart_contents: String,
    pub cart_total: f64,
    pub currency: String,
    pub time: Option<NaiveDateTime>,
    pub session_id: String,
    pub mail_sent: i64,
    pub other_fields: String,
}

fn text(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(sanitize_text_field)
        .unwrap_or_default()
}

impl From<&LegacyCart> for NewCart {
    fn from(cart: &LegacyCart) -> Self {
        Self {
            id: cart.id,
            name: text(&cart.name),
            surname: text(&cart.surname),
            email: cart.email.as_deref().map(sanitize_email).unwrap_or_default(),
            phone: text(&cart.phone),
            location: text(&cart.location),
            cart_contents: text(&cart.cart_contents),
            cart_total: round_total(cart.cart_total.unwrap_or_default()),
            currency: text(&cart.currency),
            time: cart.time.as_deref().map(sanitize_text_field).as_deref().and_then(parse_time),
            session_id: text(&cart.session_id),
            mail_sent: cart.mail_sent,
            other_fields: text(&cart.other_fields),
        }
    }
}

/// One row of the current `cartbounty` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    pub id: i64,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub cart_contents: Option<String>,
    pub cart_total: Option<f64>,
    pub currency: Option<String>,
    pub time: Option<NaiveDateTime>,
    pub session_id: Option<String>,
    pub other_fields: Option<String>,
    pub mail_sent: i64,
    pub wp_unsubscribed: i64,
    pub wp_steps_completed: i64,
    pub wp_complete: i64,
    pub cart_type: CartType,
}

impl Cart {
    /// Name and surname joined by a space, skipping empty parts.
    pub fn full_name(&self) -> String {
        [self.name.as_deref(), self.surname.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Decoded location, whichever encoding the row uses.
    pub fn location(&self) -> Location {
        Location::decode(
            self.location.as_deref().unwrap_or_default(),
            self.other_fields.as_deref(),
        )
    }

    /// Returns true when the cart holds at least one line item.
    pub fn has_contents(&self) -> bool {
        self.cart_contents
            .as_deref()
            .is_some_and(|contents| !contents.is_empty())
    }
}

impl From<NewCart> for Cart {
    fn from(cart: NewCart) -> Self {
        Self {
            id: cart.id,
            name: Some(cart.name),
            surname: Some(cart.surname),
            email: Some(cart.email),
            phone: Some(cart.phone),
            location: Some(cart.location),
            cart_contents: Some(cart.cart_contents),
            cart_total: Some(cart.cart_total),
            currency: Some(cart.currency),
            time: cart.time,
            session_id: Some(cart.session_id),
            other_fields: Some(cart.other_fields),
            mail_sent: cart.mail_sent,
            ..Default::default()
        }
    }
}

#[cfg(any(feature = "sqlite", feature = "mysql", feature = "postgres"))]
impl<R: sqlx::Row> sqlx::FromRow<'_, R> for LegacyCart
where
    i64: sqlx::Type<R::Database> + for<'r> sqlx::Decode<'r, R::Database>,
    f64: sqlx::Type<R::Database> + for<'r> sqlx::Decode<'r, R::Database>,
    String: sqlx::Type<R::Database> + for<'r> sqlx::Decode<'r, R::Database>,
    for<'r> &'r str: sqlx::ColumnIndex<R>,
{
    fn from_row(row: &R) -> Result<Self, sqlx::Error> {
        let mail_sent: Option<i64> = sqlx::Row::try_get(row, "mail_sent")?;

        Ok(LegacyCart {
            id: sqlx::Row::try_get(row, "id")?,
            name: sqlx::Row::try_get(row, "name")?,
            surname: sqlx::Row::try_get(row, "surname")?,
            email: sqlx::Row::try_get(row, "email")?,
            phone: sqlx::Row::try_get(row, "phone")?,
            location: sqlx::Row::try_get(row, "location")?,
            cart_contents: sqlx::Row::try_get(row, "cart_contents")?,
            cart_total: sqlx::Row::try_get(row, "cart_total")?,
            currency: sqlx::Row::try_get(row, "currency")?,
            time: sqlx::Row::try_get(row, "time")?,
            session_id: sqlx::Row::try_get(row, "session_id")?,
            mail_sent: mail_sent.unwrap_or_default(),
            other_fields: sqlx::Row::try_get(row, "other_fields")?,
        })
    }
}

#[cfg(any(feature = "sqlite", feature = "mysql", feature = "postgres"))]
impl<R: sqlx::Row> sqlx::FromRow<'_, R> for Cart
where
    i64: sqlx::Type<R::Database> + for<'r> sqlx::Decode<'r, R::Database>,
    f64: sqlx::Type<R::Database> + for<'r> sqlx::Decode<'r, R::Database>,
    String: sqlx::Type<R::Database> + for<'r> sqlx::Decode<'r, R::Database>,
    for<'r> &'r str: sqlx::ColumnIndex<R>,
{
    fn from_row(row: &R) -> Result<Self, sqlx::Error> {
        let time: Option<String> = sqlx::Row::try_get(row, "time")?;
        let flag = |name: &str| -> Result<i64, sqlx::Error> {
            let value: Option<i64> = sqlx::Row::try_get(row, name)?;
            Ok(value.unwrap_or_default())
        };

        Ok(Cart {
            id: sqlx::Row::try_get(row, "id")?,
            name: sqlx::Row::try_get(row, "name")?,
            surname: sqlx::Row::try_get(row, "surname")?,
            email: sqlx::Row::try_get(row, "email")?,
            phone: sqlx::Row::try_get(row, "phone")?,
            location: sqlx::Row::try_get(row, "location")?,
            cart_contents: sqlx::Row::try_get(row, "cart_contents")?,
            cart_total: sqlx::Row::try_get(row, "cart_total")?,
            currency: sqlx::Row::try_get(row, "currency")?,
            time: time.as_deref().and_then(parse_time),
            session_id: sqlx::Row::try_get(row, "session_id")?,
            other_fields: sqlx::Row::try_get(row, "other_fields")?,
            mail_sent: flag("mail_sent")?,
            wp_unsubscribed: flag("wp_unsubscribed")?,
            wp_steps_completed: flag("wp_steps_completed")?,
            wp_complete: flag("wp_complete")?,
            cart_type: flag("type")?.into(),
        })
    }
}
