// core/src/utils/mod.rs
pub mod config;
pub mod logging;
pub mod models;
