// core/src/gpu/mod.rs
pub mod monitor;
