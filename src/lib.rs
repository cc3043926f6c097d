//! Collection Tracker - compare NFT collection sales across two points in time.
//!
//! This crate fetches two snapshots of a collection's sales metrics from the
//! Blockspan analytics API, one for now and one a timeframe earlier, and
//! derives per-metric percentage changes between them.

pub mod types;
pub mod tracker;

// Re-export main types for convenience
pub use types::{BinSize, Chain, Timeframe};
