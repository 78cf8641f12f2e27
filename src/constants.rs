//! Process-wide constants shared by multiple modules

use std::time::Duration;

/// Version tag embedded in every outbound evaluation request
///
/// Downstream consumers use it to dispatch between incompatible
/// generations of the schema, so it must be bumped on every
/// breaking change to the serialized form.
pub const EVALUATION_SCHEMA_VERSION: u16 = 1;

/// Initial delay between attempts of a bounded retry
///
/// Subsequent attempts double the delay.
pub const RETRY_BACKOFF_BASE: Duration = Duration::from_millis(250);
