// core/src/lib.rs
//! Data model, snapshot store and refresh controller shared by the
//! clusterdash daemon and terminal dashboard.

pub mod dashboard;
pub mod gpu;
pub mod source;
pub mod utils;
