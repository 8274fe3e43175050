//! Route handlers, grouped by concern.

pub mod execute;
pub mod generate;
pub mod schema;
pub mod status;
