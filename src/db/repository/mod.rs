//! Repository layer: entity-scoped database operations.
//!
//! Every function takes a borrowed `Connection`; callers open one per
//! request. All public items are re-exported here.

mod artifact;
mod cluster;
mod query;

pub use artifact::*;
pub use cluster::*;
pub use query::*;
