//! API endpoint handlers, one module per feature area.

pub mod diet;
pub mod health;
pub mod lfa;
pub mod teacher;
pub mod webhook;
