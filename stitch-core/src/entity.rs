use crate::{EntityDescriptor, PkKey, Result, RowLabeled, TypeRegistry};
use std::{future::Future, sync::Arc};

/// A struct that `#[derive(Entity)]` has generated binding and wiring code
/// for.
///
/// The derive macro implements every method here; hand implementations are
/// unusual but not forbidden (the same way a driver crate hand-implements
/// `Entity` in the teacher repo for types the macro cannot see).
pub trait MappedEntity: Sized + Send + Sync + 'static {
    /// Static column/reference metadata, used by the arena and binder to
    /// avoid re-deriving shape information at every call.
    fn descriptor() -> &'static EntityDescriptor;

    /// Build one instance from a labeled row, binding every column this
    /// entity declares through the given registry. Reference fields are left
    /// at their zero value; wiring them in happens separately, once every
    /// row has been filled and deduplicated.
    fn fill(row: &RowLabeled, registry: &TypeRegistry) -> Result<Self>;

    /// Fill and store this entity's direct reference fields (and, one level
    /// further, theirs) into `arena` from the same denormalized row. Called
    /// once per row for the root entity only.
    ///
    /// Default: no reference fields, nothing to fill.
    fn fill_references(
        _row: &RowLabeled,
        _registry: &TypeRegistry,
        _arena: &crate::ModelArena,
    ) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Fill and store this entity's direct reference fields into `arena`
    /// from the same row, without recursing further. Called for entities
    /// used as a direct reference of the root, capping the reference graph
    /// at depth 2.
    ///
    /// Default: no reference fields, nothing to fill.
    fn fill_nested_references(
        _row: &RowLabeled,
        _registry: &TypeRegistry,
        _arena: &crate::ModelArena,
    ) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// String form of this entity's primary key, used for deduplication.
    /// Entities with no declared primary key return [`PkKey::Undeclared`],
    /// which disables deduplication for the type (every row produces a
    /// fresh instance).
    fn pk_key(&self) -> PkKey;

    /// Recompute a primary-key string from an explicit column list instead
    /// of the descriptor-declared PK columns, for callers overriding a
    /// type's primary key via [`crate::MapperOptions::override_pk`]. Built
    /// generically from [`MappedEntity::column_value`], so it needs no
    /// per-type generated code.
    fn pk_key_with_columns(&self, columns: &[&'static str]) -> PkKey {
        if columns.is_empty() {
            return PkKey::Undeclared;
        }
        let parts: Vec<crate::Value> = columns.iter().map(|c| self.column_value(c)).collect();
        if parts.iter().all(crate::Value::is_canonical_zero) {
            PkKey::Empty
        } else {
            PkKey::Value(
                parts
                    .iter()
                    .map(crate::Value::to_key_string)
                    .collect::<Vec<_>>()
                    .join("\u{1}"),
            )
        }
    }

    /// Read a scalar column back out as a [`crate::Value`] by its declared
    /// column name. Used during wiring to compare a parent's local `fk`
    /// columns against a candidate reference's foreign columns without
    /// either side needing to know the other's Rust field names at compile
    /// time. Returns `Value::Null` for unrecognized column names.
    fn column_value(&self, column: &str) -> crate::Value;

    /// Wire this entity's direct reference fields against the accumulated
    /// rows of the types it points to, calling [`crate::ModelArena::ensure_frozen`]
    /// for each reference target first so the lookup always sees that
    /// type's complete, deduplicated rows regardless of fill order. Called
    /// once per entity, whether `Self` is the mapper's root type or a
    /// reference reached from somewhere else in the graph — the same
    /// matching logic applies either way, since the depth-2 cap is already
    /// enforced when rows are filled (see [`MappedEntity::fill_nested_references`]),
    /// not here.
    ///
    /// Default: no reference fields, nothing to wire.
    fn wire_references(
        &mut self,
        _arena: &crate::ModelArena,
    ) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

/// Build the `SELECT <columns>` clause for an entity: each column
/// table-qualified and aliased back to its qualified form
/// (`t.c AS "t.c"`), so the row a driver hands back carries the
/// `table.column` labels [`MappedEntity::fill`] looks columns up by. A thin
/// convenience matching the trivial selector helper callers otherwise have
/// to hand-write.
pub fn select_columns<T: MappedEntity>() -> String {
    let table = T::descriptor().table;
    T::descriptor()
        .columns
        .iter()
        .map(|c| format!("{table}.{0} AS \"{table}.{0}\"", c.column))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Wrap an entity in a shareable handle, the type every reference field
/// ultimately holds once the arena freezes.
pub type Shared<T> = Arc<T>;
