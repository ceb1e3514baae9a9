// Scheduler module: the tick-driven ingestion engine

pub mod engine;

pub use engine::{EngineConfig, IngestionEngine};
