//! Assay Core — assessment catalog, directory, and database layer.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod passwords;
