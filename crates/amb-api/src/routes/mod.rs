//! # Route Modules
//!
//! Each module defines an Axum router for one API surface; [`crate::app`]
//! merges them.

pub mod ledgers;
pub mod relays;
