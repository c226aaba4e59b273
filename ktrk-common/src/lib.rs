//! Shared library for the ktrk operational tracker
//!
//! Common types and logic used by the dashboard service (ktrk-web), the
//! source adapters (ktrk-sync), and the batch pipeline (ktrk-etl):
//! error types, configuration, the canonical row representation, header
//! normalization, the database layer, and the reconciliation loader.

pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod rows;
pub mod time;

pub use error::{Error, Result};
pub use rows::Row;
