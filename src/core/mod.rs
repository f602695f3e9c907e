//! Core modules for azf: the resource cache and its shared primitives.
//!
//! Everything that touches the SQLite file lives here, along with
//! configuration, errors and output helpers used by the plugins.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod resource;
pub mod schemas;
pub mod store;
