//! ABOUTME: Core types, errors, timestamp labels, and tracing utilities
//! ABOUTME: Foundation crate used by all other lookout components

pub mod error;
pub mod telemetry;
pub mod time;

pub use error::{Error, Result};
pub use time::{timestamp_label, MonotonicTimer};

