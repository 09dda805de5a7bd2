//! Data pipeline for the client journey dashboard.
//!
//! Reads the flat-file exports, turns housing ranges into intervals, groups
//! visit and storage counts, buckets sleep check-ins into a calendar, ranks
//! case-note words and assembles the dashboard and journey reports.

pub mod aggregator;
pub mod analysis;
pub mod calendar;
pub mod intervals;
pub mod reader;
pub mod words;

pub use journey_core as core;
