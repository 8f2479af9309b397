pub mod agent;
pub mod constants;
pub mod engine;
pub mod grid;
pub mod high_score;
pub mod policy;
pub mod rng;
pub mod server_protocol;
pub mod types;
