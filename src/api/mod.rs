pub mod answer;
pub mod rpc;
