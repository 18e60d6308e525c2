//! Content admin library
//!
//! Typed records, an entity registry and a configuration-driven record table
//! bound to a managed GraphQL data API.

pub mod api;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod table;

mod client;

pub use client::*;
