//! Core domain logic for the usage collector.
//!
//! This crate contains the fundamental types and logic for:
//! - Events: screen and app transitions reported by the device
//! - Aggregation: folding events into per-day usage segments
//! - Day bucketing: splitting spans at local midnight in a fixed zone

mod aggregator;
pub mod day;
mod event;
pub mod event_type;
mod segment;
pub mod sink;
mod state;
mod types;

pub use aggregator::{AggregatorConfig, SessionAggregator};
pub use event::{EventKind, UsageEvent};
pub use event_type::{EventType, UnknownEventType};
pub use segment::UsageSegment;
pub use sink::{MemorySink, SinkCall, UsageSink};
pub use state::{Foreground, SessionState};
pub use types::{AppId, ValidationError};
