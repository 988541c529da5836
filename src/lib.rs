// src/lib.rs
// =============================================================================
// rec-crawler maps the recommendation graph around keyword search results.
//
// Modules:
// - model: videos, stubs and crawl results
// - error: the error types gateways and persistence hand back
// - gateway: where seeds and video metadata come from
// - crawl: the depth-first crawl engine and its visited table
// - persist: snapshot files and document-store records
//
// The binary in main.rs wires these together behind a small CLI.
// =============================================================================

pub mod crawl;
pub mod error;
pub mod gateway;
pub mod model;
pub mod persist;
