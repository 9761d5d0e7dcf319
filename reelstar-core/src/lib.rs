// reelstar-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts for the record source and the relational store.
pub mod ports;

// 2. Domain
// Record model, schema contract, the transform stages and the star schema.
// Depends on nothing but itself.
pub mod domain;

// 3. Infrastructure (Adapters)
// CSV source, DuckDB connector, YAML config loading, run artifacts.
pub mod infrastructure;

// 4. Application (Use Cases)
// Pipeline orchestration, loading, post-load validation, inspection.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::EtlError;
