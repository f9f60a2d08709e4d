//! Maintenance tools for the InvokeAI image catalog.
//!
//! - [`reindex`] adds catalog rows for image files the database lost track of.
//! - [`reclassify`] flips every image on a board between assets and regular
//!   images.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod reclassify;
pub mod reindex;
pub mod scanner;

pub use error::Error;
