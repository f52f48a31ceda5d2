//! Sphyre Core: fundamental types, errors, and shared infrastructure for the
//! Sphyre credential registry and consent engine.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RegistryConfig;
pub use error::CoreError;
pub use events::{EventLog, LoggedEvent, RegistryEvent, SchemaRevision};
pub use lifecycle::{LifecycleEvent, LifecycleViolation, RecordLifecycle, RecordStatus};
pub use types::{AccessLevel, Identity, Role, Timestamp, NO_EXPIRY};
