//! Queries behind the abandoned cart list view.
//!
//! Listed carts always have contents and are never [`CartType::Excluded`].
//! Request parameters are untrusted, [`CartQuery::from_request`] maps them onto
//! whitelisted values.

use crate::{cart::Cart, config::ListConfig, executor::Executor};

/// Which carts the list view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CartFilter {
    #[default]
    All,
    /// Not recovered and reachable by e-mail or phone.
    Recoverable,
    Recovered,
}

impl CartFilter {
    pub fn parse(value: &str) -> Self {
        match value {
            "recoverable" => Self::Recoverable,
            "recovered" => Self::Recovered,
            _ => Self::All,
        }
    }

    /// Returns true when the cart belongs to the list selected by this filter.
    pub fn matches(&self, cart: &Cart) -> bool {
        if !cart.has_contents() || cart.cart_type == crate::CartType::Excluded {
            return false;
        }

        let reachable = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

        match self {
            Self::All => true,
            Self::Recoverable => {
                cart.cart_type != crate::CartType::Recovered
                    && (reachable(&cart.email) || reachable(&cart.phone))
            }
            Self::Recovered => cart.cart_type == crate::CartType::Recovered,
        }
    }
}

/// Columns the list view may be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    Email,
    Phone,
    CartTotal,
    #[default]
    Time,
}

impl SortColumn {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            "cart_total" => Some(Self::CartTotal),
            "time" => Some(Self::Time),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

/// One page request of the cart list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartQuery {
    pub filter: CartFilter,
    pub sort: SortColumn,
    pub order: Order,
    /// Zero based page index.
    pub page: u32,
    pub per_page: u32,
}

impl Default for CartQuery {
    fn default() -> Self {
        Self {
            filter: CartFilter::All,
            sort: SortColumn::Time,
            order: Order::Desc,
            page: 0,
            per_page: crate::config::DEFAULT_PER_PAGE,
        }
    }
}

impl CartQuery {
    /// Builds a query from raw request parameters.
    ///
    /// `paged` is the one based page number of the request. Invalid values fall
    /// back to the first page, the `time` column, descending order and the
    /// configured page size.
    pub fn from_request(
        config: &ListConfig,
        status: Option<&str>,
        orderby: Option<&str>,
        order: Option<&str>,
        paged: Option<i64>,
        per_page: Option<i64>,
    ) -> Self {
        let order = match order {
            Some("asc") => Order::Asc,
            _ => Order::Desc,
        };

        let page = paged
            .map(|paged| (paged - 1).clamp(0, u32::MAX as i64) as u32)
            .unwrap_or(0);

        let per_page = per_page
            .filter(|per_page| *per_page >= 1)
            .map(|per_page| per_page.min(u32::MAX as i64) as u32)
            .unwrap_or(config.per_page);

        Self {
            filter: status.map(CartFilter::parse).unwrap_or_default(),
            sort: orderby.and_then(SortColumn::parse).unwrap_or_default(),
            order,
            page,
            per_page,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.per_page)
    }
}

/// A page of the cart list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartPage {
    pub items: Vec<Cart>,
    pub total_items: u64,
    pub per_page: u32,
    pub total_pages: u64,
}

/// Loads one page of carts along with the pagination totals.
pub async fn list_carts<E: Executor + ?Sized>(
    executor: &E,
    query: &CartQuery,
) -> anyhow::Result<CartPage> {
    let total_items = executor.count_carts(query.filter).await?;
    let items = executor.read_carts(query).await?;
    let per_page = query.per_page.max(1);

    Ok(CartPage {
        items,
        total_items,
        per_page,
        total_pages: total_items.div_ceil(u64::from(per_page)),
    })
}

/// Deletes the given carts, returning how many rows were removed.
pub async fn delete_carts<E: Executor + ?Sized>(executor: &E, ids: &[i64]) -> anyhow::Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let deleted = executor.delete_carts(ids).await?;
    tracing::info!(requested = ids.len(), deleted, "deleted carts");

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CartType;

    #[test]
    fn test_from_request_defaults() {
        let query = CartQuery::from_request(&ListConfig::default(), None, None, None, None, None);

        assert_eq!(query, CartQuery::default());
    }

    #[test]
    fn test_from_request_whitelist() {
        let config = ListConfig::default();

        let query = CartQuery::from_request(
            &config,
            Some("recovered"),
            Some("cart_total"),
            Some("asc"),
            Some(3),
            Some(25),
        );
        assert_eq!(query.filter, CartFilter::Recovered);
        assert_eq!(query.sort, SortColumn::CartTotal);
        assert_eq!(query.order, Order::Asc);
        assert_eq!(query.page, 2);
        assert_eq!(query.offset(), 50);

        let query = CartQuery::from_request(
            &config,
            Some("weird"),
            Some("session_id; DROP TABLE cartbounty"),
            Some("sideways"),
            Some(-4),
            Some(0),
        );
        assert_eq!(query.filter, CartFilter::All);
        assert_eq!(query.sort, SortColumn::Time);
        assert_eq!(query.order, Order::Desc);
        assert_eq!(query.page, 0);
        assert_eq!(query.per_page, 10);
    }

    #[test]
    fn test_filter_matches() {
        let cart = Cart {
            cart_contents: Some("[]".to_owned()),
            email: Some("anna@example.com".to_owned()),
            ..Default::default()
        };

        assert!(CartFilter::All.matches(&cart));
        assert!(CartFilter::Recoverable.matches(&cart));
        assert!(!CartFilter::Recovered.matches(&cart));

        let unreachable = Cart {
            email: Some(String::new()),
            ..cart.clone()
        };
        assert!(!CartFilter::Recoverable.matches(&unreachable));

        let excluded = Cart {
            cart_type: CartType::Excluded,
            ..cart.clone()
        };
        assert!(!CartFilter::All.matches(&excluded));

        let empty = Cart {
            cart_contents: Some(String::new()),
            ..cart
        };
        assert!(!CartFilter::All.matches(&empty));
    }
}
