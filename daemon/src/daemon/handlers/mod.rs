pub mod metrics_handler;

pub use metrics_handler::{handle_health, handle_metrics};
