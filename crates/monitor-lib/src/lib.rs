//! Library for the host metrics reporter
//!
//! This crate provides the core functionality for:
//! - Credential resolution for the ingestion API
//! - Host resource sampling (CPU, memory, swap, disk, burst credits)
//! - EC2 metadata and CloudWatch lookups
//! - Report encoding and delivery
//! - The periodic report loop and structured logging

pub mod cloud;
pub mod collector;
pub mod credentials;
pub mod models;
pub mod observability;
pub mod report;
pub mod reporter;
pub mod scheduler;

pub use credentials::{CredentialError, CredentialSource};
pub use models::*;
pub use observability::StructuredLogger;
pub use report::Report;
pub use reporter::{Delivery, HttpReporter, ReportSink};
pub use scheduler::{ReportLoop, ReportLoopBuilder, SchedulerConfig};
