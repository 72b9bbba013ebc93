use crate::{
    IterationCapture, IterationMode, MappedEntity, ModelArena, Result, RowLabeled, RowNames,
    TypeRegistry, binder, fill::fill_and_store,
};
use futures::{Stream, StreamExt, future::try_join_all};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Knobs for one [`map`] call.
///
/// Mirrors the original mapper's per-call options: a registry override for
/// callers that register custom column kinds, the iteration capture mode
/// for callers that want the flat row order (or a keyed lookup) alongside
/// the assembled graph, whether reference wiring runs at all, and per-type
/// primary-key overrides.
#[derive(Clone, Default)]
pub struct MapperOptions {
    pub registry: Option<Arc<TypeRegistry>>,
    pub iteration: IterationMode,
    /// How many rows to fan out fill tasks for concurrently before joining
    /// and inserting into the arena.
    pub batch_size: usize,
    /// Enable reference-field discovery and wiring. When `false`, only the
    /// root type's own scalar columns are filled — reference fields are
    /// left at their default and no reference rows are stored at all.
    pub auto_binding: bool,
    /// Per-type primary-key column overrides, replacing the
    /// descriptor-declared primary key for deduplication purposes.
    pub override_pk: HashMap<TypeId, Vec<&'static str>>,
}

impl MapperOptions {
    pub fn new() -> Self {
        Self {
            batch_size: 32,
            auto_binding: true,
            ..Default::default()
        }
    }

    /// Override `T`'s primary key with `columns` for this mapper run's
    /// deduplication purposes, in place of its descriptor-declared PK.
    pub fn override_pk_of<T: MappedEntity>(mut self, columns: Vec<&'static str>) -> Self {
        self.override_pk.insert(TypeId::of::<T>(), columns);
        self
    }
}

/// Everything one [`map`] call produces.
pub struct MapperResult<Root> {
    /// Deduplicated, reference-wired root entities, in first-seen order.
    pub data: Vec<Root>,
    /// Number of rows read from the stream, before deduplication.
    pub row_count: usize,
    /// The last-seen value of a reserved `paginate_total` column, if the
    /// query included one. `0` if absent or the stream was empty.
    pub paginate_total: u64,
    /// Column names of the first row read, empty if the stream was empty.
    pub columns: RowNames,
    pub iteration: IterationCapture,
}

/// Look up the reserved pagination column by its unqualified name,
/// case-insensitively, regardless of whether the row labeled it bare
/// (`"paginate_total"`) or table-qualified (`"orders.paginate_total"`).
fn paginate_total_column<'a>(row: &'a RowLabeled) -> Option<&'a crate::Value> {
    row.labels
        .iter()
        .position(|label| {
            let unqualified = label.rsplit('.').next().unwrap_or(label.as_str());
            unqualified.eq_ignore_ascii_case("paginate_total")
        })
        .map(|i| &row.values()[i])
}

fn paginate_total_as_u64(value: &crate::Value) -> Option<u64> {
    match value {
        crate::Value::Int32(v) => u64::try_from(*v).ok(),
        crate::Value::Int64(v) => u64::try_from(*v).ok(),
        crate::Value::Str(s) => s.parse().ok(),
        _ => None,
    }
}

/// Reconstitute a typed entity graph rooted at `Root` out of a stream of
/// denormalized result rows.
///
/// Rows are fanned out in batches: every row in a batch is filled (and its
/// reference rows discovered and stored) concurrently, then the batch is
/// joined before the next one starts, bounding how many in-flight fills can
/// contend for the arena's locks at once. Iteration capture, when enabled,
/// records each root entity as it comes off the row it was filled from,
/// before deduplication collapses repeats. Once the stream is exhausted,
/// `binder::finalize` wires and freezes the whole reachable graph bottom-up
/// starting from `Root`.
pub async fn map<Root>(
    rows: impl Stream<Item = Result<RowLabeled>> + Send,
    options: MapperOptions,
) -> Result<MapperResult<Root>>
where
    Root: MappedEntity + Clone,
{
    let registry = options
        .registry
        .clone()
        .unwrap_or_else(|| Arc::new(TypeRegistry::new()));
    let arena = ModelArena::new(registry.clone(), options.override_pk.clone());
    let batch_size = options.batch_size.max(1);
    let auto_binding = options.auto_binding;

    let mut rows = Box::pin(rows);
    let mut columns: Option<RowNames> = None;
    let mut row_count = 0usize;
    let mut paginate_total = 0u64;
    let mut batch: Vec<RowLabeled> = Vec::with_capacity(batch_size);
    let mut iteration = IterationCapture::new(&options.iteration);

    while let Some(row) = rows.next().await {
        let row = row.inspect_err(|e| log::error!("{e:#}"))?;
        if columns.is_none() {
            columns = Some(row.labels.clone());
        }
        if let Some(total) = paginate_total_column(&row).and_then(paginate_total_as_u64) {
            paginate_total = total;
        }
        row_count += 1;
        batch.push(row);
        if batch.len() == batch_size {
            log::trace!("filling a batch of {} rows for {}", batch.len(), std::any::type_name::<Root>());
            fill_batch::<Root>(
                &batch,
                &registry,
                &arena,
                auto_binding,
                &options.iteration,
                &mut iteration,
            )
            .await
            .inspect_err(|e| log::error!("{e:#}"))?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        fill_batch::<Root>(
            &batch,
            &registry,
            &arena,
            auto_binding,
            &options.iteration,
            &mut iteration,
        )
        .await
        .inspect_err(|e| log::error!("{e:#}"))?;
    }

    log::trace!("stream exhausted after {row_count} rows, wiring references");
    let roots = binder::finalize::<Root>(&arena, auto_binding)
        .await
        .inspect_err(|e| log::error!("{e:#}"))?;
    let data: Vec<Root> = roots
        .into_iter()
        .map(|arc| Arc::try_unwrap(arc).unwrap_or_else(|arc| (*arc).clone()))
        .collect();

    Ok(MapperResult {
        data,
        row_count,
        paginate_total,
        columns: columns.unwrap_or_else(|| Arc::from(Vec::new())),
        iteration,
    })
}

async fn fill_batch<Root: MappedEntity + Clone>(
    batch: &[RowLabeled],
    registry: &TypeRegistry,
    arena: &ModelArena,
    auto_binding: bool,
    mode: &IterationMode,
    iteration: &mut IterationCapture,
) -> Result<()> {
    try_join_all(
        batch
            .iter()
            .map(|row| fill_and_store::<Root>(row, registry, arena, auto_binding)),
    )
    .await?;
    for row in batch {
        iteration.push(mode, row)?;
    }
    Ok(())
}
