use crate::{Error, MapperErrorKind, Result, RowLabeled, Value};
use std::collections::HashMap;

/// The separator joining composite map-mode keys. Chosen because it cannot
/// appear in ordinary driver text values, unlike a printable delimiter.
const KEY_SEPARATOR: &str = "\u{1}";

/// How the mapper should additionally capture raw row data as it iterates
/// the result set, independent of the entity graph it is assembling.
///
/// `List` mirrors a plain `SELECT` where every row (before deduplication)
/// matters in its original order; `Map` is for callers who want O(1) lookup
/// by a composite key instead, e.g. grouping rows by a tenant id.
#[derive(Debug, Clone, Default)]
pub enum IterationMode {
    #[default]
    None,
    List,
    Map {
        /// Column names joined with [`KEY_SEPARATOR`] to form the map key.
        /// A row whose value is nil/empty on any of these is skipped.
        pk_columns: Vec<&'static str>,
        /// Columns to keep in the captured row, or `None` to keep all of
        /// them.
        store_columns: Option<Vec<&'static str>>,
    },
}

/// What [`IterationMode`] produced for a mapper run: raw row data, captured
/// independently of whatever entity graph the same rows fill.
#[derive(Debug, Clone, Default)]
pub enum IterationCapture {
    #[default]
    None,
    List(Vec<RowLabeled>),
    Map(HashMap<String, HashMap<String, Value>>),
}

impl IterationCapture {
    pub(crate) fn new(mode: &IterationMode) -> Self {
        match mode {
            IterationMode::None => IterationCapture::None,
            IterationMode::List => IterationCapture::List(Vec::new()),
            IterationMode::Map { .. } => IterationCapture::Map(HashMap::new()),
        }
    }

    pub(crate) fn push(&mut self, mode: &IterationMode, row: &RowLabeled) -> Result<()> {
        match (self, mode) {
            (IterationCapture::None, IterationMode::None) => {}
            (IterationCapture::List(items), IterationMode::List) => items.push(row.clone()),
            (
                IterationCapture::Map(items),
                IterationMode::Map {
                    pk_columns,
                    store_columns,
                },
            ) => {
                let mut key_parts = Vec::with_capacity(pk_columns.len());
                for column in pk_columns {
                    let value = row
                        .get_column(column)
                        .ok_or_else(|| Error::new(MapperErrorKind::IterationColumnMissing { column }))?;
                    if value.is_canonical_zero() {
                        return Ok(());
                    }
                    key_parts.push(value.to_key_string());
                }
                let key = key_parts.join(KEY_SEPARATOR);
                let captured: HashMap<String, Value> = match store_columns {
                    Some(columns) => columns
                        .iter()
                        .filter_map(|c| row.get_column(c).map(|v| (c.to_string(), v.clone())))
                        .collect(),
                    None => row
                        .labels
                        .iter()
                        .cloned()
                        .zip(row.values().iter().cloned())
                        .collect(),
                };
                items.insert(key, captured);
            }
            _ => unreachable!("IterationCapture variant must track IterationMode"),
        }
        Ok(())
    }
}
