use crate::{MappedEntity, Result, TypeRegistry};
use futures::future::try_join_all;
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};
use tokio::sync::{Mutex, RwLock};

/// Run a generated `wire_references` body's per-reference-field futures to
/// completion concurrently, short-circuiting on the first error. Each
/// future wires one reference field against its own, already-frozen
/// candidate set; fields are independent of each other, so there is no
/// ordering to preserve.
pub async fn join_wiring_futures<'a>(
    futures: Vec<std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>>>,
) -> Result<()> {
    try_join_all(futures).await?;
    Ok(())
}

/// The result of asking an entity for its primary-key string.
///
/// `Undeclared` and `Empty` are distinct: a type with no declared primary
/// key is never deduplicated (every fill produces a fresh row), while a
/// type that does declare one but whose key columns all came back
/// canonical-zero (`""`, `"0"`, `false`, the nil UUID) represents a row with
/// no entity present, typically the right side of a `LEFT JOIN` that did not
/// match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PkKey {
    Undeclared,
    Empty,
    Value(String),
}

struct Accumulator<T> {
    items: Vec<T>,
    pk_index: HashMap<String, usize>,
}

impl<T> Default for Accumulator<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pk_index: HashMap::new(),
        }
    }
}

/// Type-erased, per-entity-type storage for the rows a mapper run has
/// filled so far.
///
/// Lives through two phases. While rows are being filled, each type's
/// accumulator is a plain `Vec<T>` behind a short-lived mutex lock, so
/// concurrent column-filling tasks can append without taking a lock on the
/// whole arena. Once the result set is exhausted, the binder wires each
/// type's reference fields while it is still an owned `Vec<T>` (mutating in
/// place needs no interior mutability that way) and only then moves it into
/// its frozen, shareable `Vec<Arc<T>>` form, the shape every reference field
/// elsewhere in the arena actually holds.
pub struct ModelArena {
    accumulators: Mutex<HashMap<TypeId, Box<dyn Any + Send>>>,
    frozen: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    /// Per-type locks guarding the "is `T` frozen yet" check-then-act
    /// sequence in [`ModelArena::ensure_frozen`]. Keyed per type rather than
    /// one arena-wide lock so that `T`'s own wiring, which recurses into
    /// `ensure_frozen` for `T`'s reference targets, never tries to
    /// reacquire a lock it already holds.
    wiring_locks: Mutex<HashMap<TypeId, Arc<Mutex<()>>>>,
    registry: Arc<TypeRegistry>,
    /// Per-type primary-key column overrides from
    /// [`crate::MapperOptions::override_pk`], consulted by
    /// [`ModelArena::dedupe_and_store`] in place of the descriptor-declared
    /// primary key.
    override_pk: HashMap<TypeId, Vec<&'static str>>,
}

impl ModelArena {
    pub fn new(registry: Arc<TypeRegistry>, override_pk: HashMap<TypeId, Vec<&'static str>>) -> Self {
        Self {
            accumulators: Mutex::new(HashMap::new()),
            frozen: RwLock::new(HashMap::new()),
            wiring_locks: Mutex::new(HashMap::new()),
            registry,
            override_pk,
        }
    }

    /// The registry this arena's run was configured with, used during
    /// wiring to dispatch FK equality through the C1 strategy selected by
    /// each column's kind.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Insert a freshly-filled entity, deduplicating by primary key within
    /// its type. Duplicates (same type, same non-empty key) are dropped:
    /// the first row to introduce a given entity wins, later rows only
    /// contribute wiring information through their own reference fields.
    pub async fn dedupe_and_store<T: MappedEntity>(&self, entity: T) -> Result<()> {
        let key = match self.override_pk.get(&TypeId::of::<T>()) {
            Some(columns) => entity.pk_key_with_columns(columns),
            None => entity.pk_key(),
        };
        if key == PkKey::Empty {
            return Ok(());
        }
        let mut guard = self.accumulators.lock().await;
        let entry = guard
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Accumulator::<T>::default()));
        let accumulator = entry
            .downcast_mut::<Accumulator<T>>()
            .expect("accumulator type mismatch for TypeId");
        match key {
            PkKey::Undeclared => accumulator.items.push(entity),
            PkKey::Empty => unreachable!(),
            PkKey::Value(key) => {
                if !accumulator.pk_index.contains_key(&key) {
                    accumulator.pk_index.insert(key, accumulator.items.len());
                    accumulator.items.push(entity);
                }
            }
        }
        Ok(())
    }

    /// Remove and return the raw, not-yet-wired accumulator for `T`. Empty
    /// if `T` was never filled, or has already been taken.
    async fn take_accumulated<T: MappedEntity>(&self) -> Vec<T> {
        let mut guard = self.accumulators.lock().await;
        match guard.remove(&TypeId::of::<T>()) {
            Some(boxed) => {
                boxed
                    .downcast::<Accumulator<T>>()
                    .expect("accumulator type mismatch for TypeId")
                    .items
            }
            None => Vec::new(),
        }
    }

    /// Make sure every accumulated entity of type `T` has been wired
    /// against its own reference fields and frozen into its shareable,
    /// lookup-ready form.
    ///
    /// Idempotent and safe to call from more than one reference field's
    /// wiring code: the first caller to reach a given `T` does the work,
    /// every later call (the same type reached again through another
    /// parent, or through more than one reference field of the same
    /// parent) sees it already in `frozen` and returns immediately.
    /// Wiring itself recurses: `T::wire_references` calls `ensure_frozen`
    /// for each of `T`'s own reference targets before reading them, so the
    /// whole reachable graph resolves bottom-up from a single root call.
    pub async fn ensure_frozen<T: MappedEntity>(&self) -> Result<()> {
        let type_lock = {
            let mut locks = self.wiring_locks.lock().await;
            locks
                .entry(TypeId::of::<T>())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = type_lock.lock().await;
        {
            let frozen = self.frozen.read().await;
            if frozen.contains_key(&TypeId::of::<T>()) {
                return Ok(());
            }
        }
        let items = self.take_accumulated::<T>().await;
        // One task per accumulated entry: each entry's reference fields
        // are wired (and, within that, fanned out across fields — see
        // `emit_wire_references`) independently of its siblings.
        let wired: Vec<T> = try_join_all(items.into_iter().map(|mut item| async move {
            item.wire_references(self).await?;
            Ok::<T, crate::Error>(item)
        }))
        .await?;
        let shared: Vec<Arc<T>> = wired.into_iter().map(Arc::new).collect();
        let mut frozen = self.frozen.write().await;
        frozen.entry(TypeId::of::<T>()).or_insert_with(|| Box::new(shared));
        Ok(())
    }

    /// Freeze `T`'s accumulator without wiring any reference fields, for a
    /// run with `auto_binding` disabled: only the main model was ever
    /// filled, so there is nothing to wire.
    pub async fn freeze_without_wiring<T: MappedEntity>(&self) -> Result<()> {
        let type_lock = {
            let mut locks = self.wiring_locks.lock().await;
            locks
                .entry(TypeId::of::<T>())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = type_lock.lock().await;
        {
            let frozen = self.frozen.read().await;
            if frozen.contains_key(&TypeId::of::<T>()) {
                return Ok(());
            }
        }
        let items = self.take_accumulated::<T>().await;
        let shared: Vec<Arc<T>> = items.into_iter().map(Arc::new).collect();
        let mut frozen = self.frozen.write().await;
        frozen.entry(TypeId::of::<T>()).or_insert_with(|| Box::new(shared));
        Ok(())
    }

    /// Read the frozen, deduplicated rows of type `T`. Empty if `T` was
    /// never filled or has not been frozen yet.
    pub async fn frozen_items<T: MappedEntity>(&self) -> Vec<Arc<T>> {
        let frozen = self.frozen.read().await;
        match frozen.get(&TypeId::of::<T>()) {
            Some(boxed) => boxed
                .downcast_ref::<Vec<Arc<T>>>()
                .expect("frozen type mismatch for TypeId")
                .clone(),
            None => Vec::new(),
        }
    }
}

impl Default for ModelArena {
    fn default() -> Self {
        Self::new(Arc::new(TypeRegistry::new()), HashMap::new())
    }
}
