mod arena;
mod as_value;
mod binder;
mod descriptor;
mod entity;
mod error;
mod fill;
mod iteration;
mod mapper;
mod registry;
mod row;
mod util;
mod value;

pub use arena::*;
pub use as_value::*;
pub use binder::*;
pub use descriptor::*;
pub use entity::*;
pub use error::*;
pub use fill::*;
pub use iteration::*;
pub use mapper::*;
pub use registry::*;
pub use row::*;
pub use util::*;
pub use value::*;

pub use ::anyhow::Context as ErrorContext;
