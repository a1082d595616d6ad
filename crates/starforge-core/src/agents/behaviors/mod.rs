//! Built-in behaviors.

mod auto_builder;
mod idle;
mod production_monitor;
mod resource_ferry;

pub use auto_builder::{AutoBuilder, AutoBuilderConfig};
pub use idle::Idle;
pub use production_monitor::{ProductionMonitor, ProductionMonitorConfig};
pub use resource_ferry::{ResourceFerry, ResourceFerryConfig};
