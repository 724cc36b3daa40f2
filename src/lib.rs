//! # Adsync Library
//!
//! This library provides the core functionality for the Adsync service:
//! the durable sync job queue, the Meta insights fetch-and-ingest pipeline,
//! and the HTTP surface for enqueueing work and reading aggregates.

pub mod aggregate;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod meta;
pub mod models;
pub mod repositories;
pub mod server;
pub mod sync;
pub mod telemetry;
pub mod worker;
pub use migration;
