use crate::{Error, MappedEntity, MapperErrorKind, ModelArena, Result, RowLabeled, TypeRegistry};
use std::panic::{self, AssertUnwindSafe};

/// Fill one entity out of a row and store it into the arena, deduplicating
/// by primary key. Returns a clone of the filled (pre-wiring) entity for
/// callers that need it for iteration capture.
///
/// A filler panic (a bug in hand-written `MappedEntity::fill`, or in
/// generated code hitting an unexpected column shape) is caught and turned
/// into an error rather than tearing down the whole mapping run, since a
/// single malformed row should not lose every other row already collected.
/// When `auto_binding` is `false`, reference fields are not even discovered:
/// only this entity's own scalar columns are filled.
pub async fn fill_and_store<T: MappedEntity + Clone>(
    row: &RowLabeled,
    registry: &TypeRegistry,
    arena: &ModelArena,
    auto_binding: bool,
) -> Result<T> {
    let entity = panic::catch_unwind(AssertUnwindSafe(|| T::fill(row, registry)))
        .map_err(|_| {
            let error = Error::new(MapperErrorKind::Panicked {
                entity: type_name::<T>(),
            });
            log::error!("{error:#}");
            error
        })??;
    if auto_binding {
        T::fill_references(row, registry, arena).await?;
    }
    let captured = entity.clone();
    arena.dedupe_and_store(entity).await?;
    Ok(captured)
}

fn type_name<T>() -> &'static str {
    std::any::type_name::<T>()
}

/// Whether a parent's local foreign-key column values match a candidate
/// child's corresponding column values, dispatched "under the C1 strategy
/// selected by the parent column's kind" rather than compared with a raw
/// `==`. `local` pairs each value with the registered kind name of the
/// column it came from (`None` for an unregistered/passthrough kind);
/// `foreign` is aligned by position with `local`, mirroring the
/// `fk = "local:foreign"` pairs declared on a reference field.
///
/// A kind with no registered strategy falls back to the default
/// "zero-on-either-side never matches" comparison; a registered kind's own
/// `equal` decides entirely, including the deliberate `bool`/`zerobool`
/// exception to that rule (see [`crate::BoolKind`]).
pub fn fk_matches(
    registry: &TypeRegistry,
    local: &[(crate::Value, Option<&str>)],
    foreign: &[crate::Value],
) -> bool {
    local.len() == foreign.len()
        && !local.is_empty()
        && local.iter().zip(foreign.iter()).all(|((value, kind), other)| {
            match kind.and_then(|k| registry.get(k)) {
                Some(strategy) => strategy.equal(value, other),
                None => !value.is_canonical_zero() && !other.is_canonical_zero() && value == other,
            }
        })
}
