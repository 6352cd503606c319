pub mod calculator;
pub mod fx;
pub mod knowledge;
pub mod registry;
pub mod weather;

pub use registry::{build_registry, offline_registry, ToolMeta, ToolRegistry};
