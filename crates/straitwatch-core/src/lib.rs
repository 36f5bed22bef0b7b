//! Core types and correlation logic for the Straitwatch early-warning engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod alert;
pub mod engine;
pub mod error;
pub mod event;
pub mod matcher;
pub mod region;
pub mod score;
pub mod store;
pub mod threat;

pub use error::{Error, Result};
