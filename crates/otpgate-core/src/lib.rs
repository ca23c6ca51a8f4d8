//! Shared plumbing for otpgate services: configuration loading, tracing setup,
//! HTTP middleware and health endpoints.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
