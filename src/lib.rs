//! Shelf Library
//!
//! Expiring metadata caches and content-source provider discovery.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod paths;
pub mod provider;

pub use app::AppContext;
