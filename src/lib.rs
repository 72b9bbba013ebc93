//! Stitch: a relational object mapper that reconstitutes typed entity graphs
//! from denormalized SQL result rows, deduplicating repeated rows and
//! auto-wiring foreign-key reference fields up to two levels deep.
//!
//! This crate is a thin facade: [`stitch_core`] holds the mapper engine and
//! [`stitch_macros`] provides the `#[derive(Entity)]` macro that generates
//! [`MappedEntity`] implementations from struct and field attributes. Most
//! consumers only need what this crate re-exports.

pub use stitch_core::*;
pub use stitch_macros::Entity;
