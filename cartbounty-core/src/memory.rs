//! In-memory executor.
//!
//! Keeps carts and options behind a shared [`RwLock`], clones share the same
//! state. Used by tests and for trying the transfer without a database.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    cart::{Cart, LegacyCart, NewCart},
    config::ConflictPolicy,
    error::WriteError,
    executor::Executor,
    listing::{CartFilter, CartQuery, Order, SortColumn},
};

#[derive(Debug, Clone, Default)]
struct State {
    legacy: Option<Vec<LegacyCart>>,
    carts: BTreeMap<i64, Cart>,
    options: HashMap<String, String>,
    legacy_reads: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Memory(Arc<RwLock<State>>);

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor whose legacy table holds the given carts.
    pub fn with_legacy(carts: Vec<LegacyCart>) -> Self {
        let memory = Self::default();
        memory.0.write().legacy = Some(carts);

        memory
    }

    /// Stores a cart as is, replacing any cart with the same id.
    pub fn insert_cart(&self, cart: Cart) {
        self.0.write().carts.insert(cart.id, cart);
    }

    /// Every stored cart ordered by id.
    pub fn carts(&self) -> Vec<Cart> {
        self.0.read().carts.values().cloned().collect()
    }

    /// Number of times the legacy table was read.
    pub fn legacy_reads(&self) -> usize {
        self.0.read().legacy_reads
    }
}

// A batch behaves like a single INSERT statement, it is either fully applied
// or not at all.
fn write_batch(
    carts: &mut BTreeMap<i64, Cart>,
    batch: &[NewCart],
    conflict: ConflictPolicy,
) -> Result<u64, WriteError> {
    let mut pending = BTreeMap::new();

    for cart in batch {
        if carts.contains_key(&cart.id) || pending.contains_key(&cart.id) {
            match conflict {
                ConflictPolicy::Fail => return Err(WriteError::DuplicateCart),
                ConflictPolicy::Skip => continue,
            }
        }

        pending.insert(cart.id, Cart::from(cart.clone()));
    }

    let rows = pending.len() as u64;
    carts.extend(pending);

    Ok(rows)
}

fn compare(a: &Cart, b: &Cart, sort: SortColumn) -> Ordering {
    let ordering = match sort {
        SortColumn::Id => a.id.cmp(&b.id),
        SortColumn::Name => a.name.cmp(&b.name),
        SortColumn::Email => a.email.cmp(&b.email),
        SortColumn::Phone => a.phone.cmp(&b.phone),
        SortColumn::CartTotal => a
            .cart_total
            .partial_cmp(&b.cart_total)
            .unwrap_or(Ordering::Equal),
        SortColumn::Time => a.time.cmp(&b.time),
    };

    ordering.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl Executor for Memory {
    async fn legacy_table_exists(&self) -> anyhow::Result<bool> {
        Ok(self.0.read().legacy.is_some())
    }

    async fn read_legacy_carts(&self) -> anyhow::Result<Vec<LegacyCart>> {
        let mut state = self.0.write();
        state.legacy_reads += 1;

        let Some(legacy) = &state.legacy else {
            anyhow::bail!("legacy cart table does not exist");
        };

        Ok(legacy
            .iter()
            .filter(|cart| cart.cart_contents.as_deref().is_some_and(|c| !c.is_empty()))
            .cloned()
            .collect())
    }

    async fn drop_legacy_table(&self) -> anyhow::Result<()> {
        self.0.write().legacy = None;

        Ok(())
    }

    async fn insert_carts(
        &self,
        carts: &[NewCart],
        conflict: ConflictPolicy,
    ) -> Result<u64, WriteError> {
        write_batch(&mut self.0.write().carts, carts, conflict)
    }

    async fn insert_carts_atomic(
        &self,
        batches: &[&[NewCart]],
        conflict: ConflictPolicy,
    ) -> Result<u64, WriteError> {
        let mut state = self.0.write();
        let mut carts = state.carts.clone();
        let mut rows = 0;

        for batch in batches {
            rows += write_batch(&mut carts, batch, conflict)?;
        }

        state.carts = carts;

        Ok(rows)
    }

    async fn get_option(&self, name: &str) -> anyhow::Result<Option<String>> {
        Ok(self.0.read().options.get(name).cloned())
    }

    async fn update_option(&self, name: &str, value: &str) -> anyhow::Result<()> {
        self.0
            .write()
            .options
            .insert(name.to_owned(), value.to_owned());

        Ok(())
    }

    async fn add_option(&self, name: &str, value: &str) -> anyhow::Result<bool> {
        let mut state = self.0.write();

        if state.options.contains_key(name) {
            return Ok(false);
        }

        state.options.insert(name.to_owned(), value.to_owned());

        Ok(true)
    }

    async fn delete_option(&self, name: &str) -> anyhow::Result<()> {
        self.0.write().options.remove(name);

        Ok(())
    }

    async fn read_carts(&self, query: &CartQuery) -> anyhow::Result<Vec<Cart>> {
        let state = self.0.read();
        let mut carts = state
            .carts
            .values()
            .filter(|cart| query.filter.matches(cart))
            .collect::<Vec<_>>();

        carts.sort_by(|a, b| match query.order {
            Order::Asc => compare(a, b, query.sort),
            Order::Desc => compare(b, a, query.sort),
        });

        Ok(carts
            .into_iter()
            .skip(usize::try_from(query.offset())?)
            .take(query.per_page as usize)
            .cloned()
            .collect())
    }

    async fn count_carts(&self, filter: CartFilter) -> anyhow::Result<u64> {
        let state = self.0.read();

        Ok(state.carts.values().filter(|cart| filter.matches(cart)).count() as u64)
    }

    async fn delete_carts(&self, ids: &[i64]) -> anyhow::Result<u64> {
        let mut state = self.0.write();

        Ok(ids
            .iter()
            .filter(|id| state.carts.remove(*id).is_some())
            .count() as u64)
    }
}
