//! Core types for the client journey pipeline.
//!
//! Holds the in-memory table model, the pipeline's output records, the error
//! type, configuration, client identifier resolution and the stopword list.

pub mod error;
pub mod identifiers;
pub mod models;
pub mod settings;
pub mod stopwords;
pub mod time_utils;

pub use error::{JourneyError, Result};
