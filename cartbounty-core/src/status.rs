//! Cart status labels shown in the list view.

use chrono::{NaiveDateTime, TimeDelta};

use crate::{
    cart::{Cart, CartType},
    config::StatusConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTag {
    /// The cart was turned into an order.
    Recovered,
    /// The customer may still be shopping.
    Shopping,
    /// Recently abandoned (or recovered).
    New,
    /// Recovery e-mails have been sent for this cart.
    Synced,
}

/// Labels of a cart at `now`.
///
/// Carts without a time are treated as very old.
pub fn classify(cart: &Cart, now: NaiveDateTime, config: &StatusConfig) -> Vec<StatusTag> {
    let recovered = cart.cart_type == CartType::Recovered;
    let mut tags = Vec::new();

    if recovered {
        tags.push(StatusTag::Recovered);
    }

    let younger_than = |window| {
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        cart.time
            .is_some_and(|time| now.signed_duration_since(time) < window)
    };

    if younger_than(config.waiting_time) && !recovered {
        tags.push(StatusTag::Shopping);
        return tags;
    }

    if younger_than(config.new_notice) {
        tags.push(StatusTag::New);
    }

    if !recovered && cart.wp_steps_completed > 0 {
        tags.push(StatusTag::Synced);
    }

    tags
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    fn cart(minutes_ago: i64, cart_type: CartType, steps: i64) -> Cart {
        Cart {
            time: Some(now() - TimeDelta::minutes(minutes_ago)),
            cart_type,
            wp_steps_completed: steps,
            ..Default::default()
        }
    }

    #[test]
    fn test_classify() {
        let config = StatusConfig::default();

        assert_eq!(
            classify(&cart(5, CartType::Abandoned, 0), now(), &config),
            vec![StatusTag::Shopping]
        );
        assert_eq!(
            classify(&cart(90, CartType::Abandoned, 1), now(), &config),
            vec![StatusTag::New, StatusTag::Synced]
        );
        assert_eq!(
            classify(&cart(600, CartType::Abandoned, 1), now(), &config),
            vec![StatusTag::Synced]
        );
        assert_eq!(
            classify(&cart(5, CartType::Recovered, 1), now(), &config),
            vec![StatusTag::Recovered, StatusTag::New]
        );
        assert_eq!(
            classify(&cart(600, CartType::Recovered, 0), now(), &config),
            vec![StatusTag::Recovered]
        );
    }

    #[test]
    fn test_classify_without_time() {
        let cart = Cart::default();

        assert!(classify(&cart, now(), &StatusConfig::default()).is_empty());
    }
}
