//! Typed models

mod entity;
mod field;
mod record;
mod record_serde;
mod value;

pub use entity::*;
pub use field::*;
pub use record::*;
pub use value::*;
