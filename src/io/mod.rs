//! IO modules - file boundary around the assembly pipeline
//!
//! - `event_source` - Loads extracted events (JSON array or JSONL)
//! - `egress` - Itinerary and event output files

pub mod egress;
pub mod event_source;

// Re-export commonly used types
pub use egress::Egress;
pub use event_source::load_events;
