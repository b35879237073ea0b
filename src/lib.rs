pub mod config;
pub mod constants;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod observability;

// Pure transformations: import, quality gate, export, parent aggregation
pub mod processing;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

// Domain data shapes shared across layers
pub mod domain;
