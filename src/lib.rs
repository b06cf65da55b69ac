// Library exports for the light-cycle agent
// This allows the replay and self-play tools to use the core engine

pub mod arena;
pub mod board;
pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod error;
pub mod heuristic;
pub mod replay;
pub mod simple_profiler;
pub mod space;
pub mod types;
