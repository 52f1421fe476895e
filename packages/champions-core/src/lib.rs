//! Core storage for the champion catalogue.
//!
//! Provides the JSON record store with whole-file persistence, the
//! champion model and its validation rules, and the derived
//! aspect-to-champion index kept alongside the primary table.

pub mod aspects;
pub mod champion;
pub mod config;
pub mod database;
pub mod error;
pub mod persistence;
pub mod record;

pub use database::Database;
pub use record::{Filter, Record};
