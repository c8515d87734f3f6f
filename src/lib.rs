//! roomcat: rental room catalog
//!
//! Listings live in one table, stored either in a remote spreadsheet or in a
//! local CSV file, and are always read and written whole.

pub mod cli;
pub mod core;
