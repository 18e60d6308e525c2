//! Data API operations

mod crud;
mod execute;
mod graphql;
mod memory;

pub use crud::*;
pub use execute::*;
pub use graphql::*;
pub use memory::*;
