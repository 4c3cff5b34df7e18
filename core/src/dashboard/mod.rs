// core/src/dashboard/mod.rs
pub mod controller;
pub mod store;
pub mod synthetic;

pub use controller::{ControllerSettings, Mode, RefreshController};
pub use store::{DashboardView, SnapshotStore};
