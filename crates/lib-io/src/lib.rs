//! # lib-io
//!
//! Readers for wake-kernel input data.
//!
//! This crate provides loaders for:
//! - Field datasets (JSON, time-major field components plus run scalars)
//! - Reference solver results (JSON or two-column ASCII exports)
//! - Generic two-column ASCII tables
//!
//! The table parser is built on `nom`; JSON goes through `serde_json`.

pub mod error;
pub mod dataset;
pub mod reference;
pub mod table;

pub use error::{IoError, IoResult};
pub use dataset::{load_dataset, parse_dataset, BeamScalars, FieldDataset, Geometry};
pub use reference::{load_reference, load_reference_tables, parse_reference};
pub use table::{load_table, parse_table, Table};
