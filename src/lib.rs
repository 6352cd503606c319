//! Planner agent: an LLM picks one tool (calculator, weather, knowledge base or
//! currency conversion) per query, the registry runs it, and the orchestrator
//! always hands back a single answer string.

pub mod agent;
pub mod api;
pub mod cli;
pub mod clients;
pub mod core;
pub mod infra;
pub mod planner;
pub mod tools;

pub use agent::{answer, Agent};
