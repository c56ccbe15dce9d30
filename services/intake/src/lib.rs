//! Site-visit intake service library.
//!
//! This crate primarily ships an `intake` binary, but we expose a small
//! library surface to enable integration testing and reuse.

pub mod api;
pub mod config;
pub mod db;
pub mod export;
pub mod issuer;
pub mod model;
pub mod state;
pub mod store;
