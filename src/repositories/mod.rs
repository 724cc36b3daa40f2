//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for database entities, providing a clean API for data access with tenant-aware methods.

pub mod ad_account;
pub mod connection;
pub mod queue;

pub use ad_account::AdAccountRepository;
pub use connection::ConnectionRepository;
pub use queue::JobQueue;
