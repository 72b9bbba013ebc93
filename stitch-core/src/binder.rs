use crate::{MappedEntity, ModelArena, Result};
use std::sync::Arc;

/// Finalize a mapper run: wire every entity's reference fields, bottom-up
/// through the whole reachable graph, and hand back the root rows, still
/// deduplicated and in arena order.
///
/// Wiring `Root` recurses into every type `Root` references (and, for each
/// of those, every type it references in turn) through
/// [`ModelArena::ensure_frozen`], so a single call here resolves the
/// complete graph regardless of its shape. When `auto_binding` is `false`,
/// reference fields were never even discovered at fill time, so `Root`'s
/// accumulator is simply frozen as-is, with no wiring pass at all.
pub async fn finalize<Root: MappedEntity>(
    arena: &ModelArena,
    auto_binding: bool,
) -> Result<Vec<Arc<Root>>> {
    if auto_binding {
        arena.ensure_frozen::<Root>().await?;
    } else {
        arena.freeze_without_wiring::<Root>().await?;
    }
    Ok(arena.frozen_items::<Root>().await)
}
