//! Catalog queries
//!
//! Read-only access to the `songs` and `verses` tables. Each query borrows a
//! connection from the pool for its own duration only.

pub mod songs;
pub mod verses;
