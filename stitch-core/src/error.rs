use std::fmt;

/// Mapper-specific failure kinds, wrapped into [`Error`] for context.
///
/// These are the cases the original mapper treats as distinct failure
/// classes rather than generic conversion errors: a malformed `fk` tag, a
/// `#[entity(iter = ...)]` key referencing a column the row does not carry,
/// a column bind that failed, and a filler panic that was caught and
/// converted rather than allowed to unwind across a row.
#[derive(Debug)]
pub enum MapperErrorKind {
    FkTagInvalid {
        entity: &'static str,
        tag: &'static str,
    },
    IterationColumnMissing {
        column: &'static str,
    },
    BindFailed {
        entity: &'static str,
        column: &'static str,
    },
    Panicked {
        entity: &'static str,
    },
}

impl fmt::Display for MapperErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FkTagInvalid { entity, tag } => {
                write!(f, "entity `{entity}` has an invalid fk tag `{tag}`")
            }
            Self::IterationColumnMissing { column } => write!(
                f,
                "iteration mode declares key column `{column}` which the row does not contain"
            ),
            Self::BindFailed { entity, column } => {
                write!(f, "entity `{entity}` failed to bind column `{column}`")
            }
            Self::Panicked { entity } => {
                write!(f, "filling entity `{entity}` panicked")
            }
        }
    }
}

impl std::error::Error for MapperErrorKind {}

/// Crate-wide result alias using `anyhow` for flexible error context.
pub type Result<T> = anyhow::Result<T>;
/// Crate-wide error alias using `anyhow`.
pub type Error = anyhow::Error;
