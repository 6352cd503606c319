//! Core types & traits: domain-agnostic contracts for plans, tools and the model backend.

pub mod error;
pub mod model;
pub mod plan;
pub mod rpc;
pub mod tool;

pub use error::{CapabilityError, ErrorKind};
pub use plan::{Plan, ToolArgs, ToolId};
pub use tool::{Capability, ToolOutput, ToolSpec};
