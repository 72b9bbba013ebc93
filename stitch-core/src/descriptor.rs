/// How many rows on the "many" side a reference can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// `Option<Arc<T>>` field.
    One,
    /// `Vec<Arc<T>>` field.
    Many,
}

/// Static metadata for one scalar column, generated by `#[derive(Entity)]`
/// from a field's `#[entity(...)]` attributes.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMeta {
    /// The result-row column name this field is filled from.
    pub column: &'static str,
    /// Registered [`crate::ColumnKind`] name, or `None` for passthrough.
    pub kind: Option<&'static str>,
    /// Whether this column participates in the entity's primary key.
    pub is_pk: bool,
}

/// One column of a `fk = "local:foreign"` pair declared on a reference
/// field.
#[derive(Debug, Clone, Copy)]
pub struct FkPair {
    pub local: &'static str,
    pub foreign: &'static str,
}

/// Static metadata for one reference field (a field pointing at another
/// mapped entity), generated by `#[derive(Entity)]`.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceMeta {
    /// Name of the referenced entity's type, for diagnostics.
    pub target: &'static str,
    pub cardinality: Cardinality,
    pub fk: &'static [FkPair],
}

/// Static metadata for a mapped entity type: its table name and the shape
/// the derive macro discovered in its struct definition.
#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    pub table: &'static str,
    pub columns: &'static [ColumnMeta],
    pub references: &'static [ReferenceMeta],
}

impl EntityDescriptor {
    /// Columns forming the primary key, in declaration order.
    pub fn pk_columns(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns.iter().filter(|c| c.is_pk)
    }
}
