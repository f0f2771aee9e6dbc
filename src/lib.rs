//! Cluster Templates Operator Library
//!
//! This library provides the reconciliation core of the cluster templates
//! operator. It can be used both as a binary and as a library for testing.

pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod helm;
pub mod hypershift;
pub mod manifest;
pub mod models;
pub mod reconciler;
pub mod setup;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use reconciler::{Collaborators, PassOutcome, Reconciler, ReconcilerSettings};
