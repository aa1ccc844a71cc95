//! Services - timeline assembly stages
//!
//! This module contains the assembly pipeline, leaves first:
//! - `filter` - Traveler and cancellation filters
//! - `dedup` - Collapses duplicate bookings into one richer event
//! - `signals` - Derives and orders ENTER/EXIT/PRESENT signals
//! - `assembler` - State machine turning signals into visits
//! - `merger` - Collapses adjacent same-city visits
//! - `gap_detector` - Reports unexplained stretches between visits
//! - `pipeline` - Runs the stages in order

pub mod assembler;
pub mod dedup;
pub mod filter;
pub mod gap_detector;
pub mod merger;
pub mod pipeline;
pub mod signals;

// Re-export commonly used types
pub use assembler::VisitAssembler;
pub use dedup::Deduplicator;
pub use pipeline::{build_timeline, Pipeline, PipelineOutput};
