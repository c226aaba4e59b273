//! Batch ETL pipeline for the tracker
//!
//! An independent flow from the interactive reconciliation path: extract
//! rows from a configured source, validate them against a declarative
//! schema, quarantine the invalid ones, and write the valid ones to a
//! flat output file, with a per-run summary. Runs are repeatable and
//! share no state between sources.

pub mod config;
pub mod output;
pub mod pipeline;
pub mod schema;
