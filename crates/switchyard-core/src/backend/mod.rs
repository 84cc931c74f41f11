//! Backend - workflow engine abstraction
//!
//! This module defines the collaborator contract every workflow engine client
//! implements, plus the value types exchanged across it.
//!
//! # Module Structure
//!
//! - `types`: Backend and flow descriptions, probe and execution outcomes
//! - `client`: BackendClient trait definition
//! - `mock`: Scripted backend for testing

mod client;
mod mock;
mod types;

#[cfg(test)]
mod tests;

pub use client::{BackendClient, BackendClientError};
pub use mock::MockBackend;
pub use types::{
    BackendDescriptor, BackendId, BackendKind, ConnectionResult, ConnectionStatus,
    ExecutionOutcome, Flow, FlowPerformance, HealthStatus,
};
