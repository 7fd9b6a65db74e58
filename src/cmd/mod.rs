//! Command-line entry points.

pub mod extract;
pub mod render;
pub mod schema;
