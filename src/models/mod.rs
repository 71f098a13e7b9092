//! Domain records persisted by the record store.

mod artifact;
mod cluster;
mod query;

pub use artifact::*;
pub use cluster::*;
pub use query::*;
