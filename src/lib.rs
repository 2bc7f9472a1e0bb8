//! Library exports for the WanderLust rental service
//!
//! Exposes the domain modules and the router for the binary and the
//! integration tests.

pub mod availability;
pub mod config;
pub mod database;
pub mod error;
pub mod extractors;
pub mod handler;
pub mod id;
pub mod lifecycle;
pub mod middleware;
pub mod model;
pub mod payment;
pub mod pricing;
pub mod rate_limit;
pub mod route;
pub mod search;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_helpers;
