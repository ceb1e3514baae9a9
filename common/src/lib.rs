// Common library for the scheduled ingestion engine

pub mod config;
pub mod errors;
pub mod executor;
pub mod fallback;
pub mod models;
pub mod registry;
pub mod runlog;
pub mod schedule;
pub mod scheduler;
pub mod substitution;
pub mod telemetry;
pub mod transform;
pub mod webhook;
