//! Shared primitive types used across the entire pipeline.

use chrono::{DateTime, Utc};

/// A stable, unique identifier for a customer.
pub type CustomerId = String;

/// The fixed point in time recency is measured against.
/// Always supplied by the caller, never read from the wall clock.
pub type ReferenceInstant = DateTime<Utc>;

/// Identifier attached to a single runner invocation.
pub type RunId = String;
