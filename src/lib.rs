pub mod audit;
pub mod config;
pub mod devtools;
pub mod telemetry;

pub use config::{ConfigLoader, PlanetyConfig};
pub use devtools::DevTools;
pub use telemetry::TelemetryRecorder;
